use crate::calculations::{CantonRegistry, ChurchRates, MunicipalMultipliers, WealthSchedules};
use crate::models::{JurisdictionTaxTable, TaxYearConfig};

/// Reference data of one tax year. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct TaxReference {
    pub config: TaxYearConfig,
    pub federal: JurisdictionTaxTable,
    pub cantons: CantonRegistry,
    pub municipal: MunicipalMultipliers,
    pub church: ChurchRates,
    pub wealth: WealthSchedules,
}

impl TaxReference {
    pub fn tax_year(&self) -> i32 {
        self.config.tax_year
    }
}
