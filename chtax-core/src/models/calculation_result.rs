use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{
    CantonTaxBreakdown, ChurchTaxBreakdown, DeductionBreakdown, IncomeBreakdown, MunicipalTax,
    SocialSecuritySummary, WealthTaxBreakdown,
};
use crate::models::{CantonCode, FilingId};

/// Complete tax computation for one filing. Serialized as the snapshot the
/// calculation store keeps.
///
/// `taxable_income` is never negative and `total_tax` is the sum of the five
/// jurisdictional amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub filing_id: FilingId,
    pub tax_year: i32,
    pub canton: CantonCode,
    pub is_primary: bool,

    pub income: IncomeBreakdown,
    pub deductions: DeductionBreakdown,
    pub taxable_income: Decimal,

    pub federal_tax: Decimal,
    pub cantonal_tax: Decimal,
    pub municipal_tax: Decimal,
    pub church_tax: Decimal,
    pub wealth_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub monthly_tax: Decimal,

    pub cantonal: CantonTaxBreakdown,
    pub municipal: MunicipalTax,
    pub church: ChurchTaxBreakdown,
    pub wealth: Option<WealthTaxBreakdown>,
    /// Employment contributions; primary filings only.
    pub social_security: Option<SocialSecuritySummary>,
    /// Self-employed AHV; primary filings only.
    pub self_employed_social_security: Option<SocialSecuritySummary>,

    /// Local failures the computation recovered from.
    #[serde(default)]
    pub warnings: Vec<String>,
}
