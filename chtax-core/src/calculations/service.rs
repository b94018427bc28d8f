//! The per-filing tax pipeline.
//!
//! 1. aggregate income for the filing's scope
//! 2. social-security contributions (primary only)
//! 3. deductions, including the deductible contribution share
//! 4. taxable income, never negative
//! 5. federal tax (primary only)
//! 6. cantonal tax, falling back to a flat rate when the canton fails
//! 7. municipal tax from the municipality's multiplier
//! 8. church tax and, for the primary filing, wealth tax
//!
//! Reference data is looked up by tax year; each year is an immutable
//! [`TaxReference`] shared through an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{checked_sum, non_negative, ratio_or_zero, round_half_up, round_rate};
use crate::calculations::{
    CalculationError, CantonTaxBreakdown, CantonTaxCalculator, ChurchTaxService, Computed,
    DeductionCalculator, FederalTaxCalculator, FilingScope, IncomeBreakdown, SocialSecurityCalculator,
    SocialSecuritySummary, TaxReference, WealthTaxService,
};
use crate::db::CalculationStore;
use crate::models::{CalculationResult, Filing, FilingId, TaxProfile, TaxYearConfig};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

#[derive(Debug, Clone, Default)]
pub struct TaxCalculationService {
    references: BTreeMap<i32, Arc<TaxReference>>,
}

impl TaxCalculationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(
        mut self,
        reference: impl Into<Arc<TaxReference>>,
    ) -> Self {
        self.insert_reference(reference);
        self
    }

    /// Registers the reference data of a year, replacing any previous one.
    pub fn insert_reference(
        &mut self,
        reference: impl Into<Arc<TaxReference>>,
    ) {
        let reference = reference.into();
        self.references.insert(reference.tax_year(), reference);
    }

    pub fn supported_years(&self) -> Vec<i32> {
        self.references.keys().copied().collect()
    }

    pub fn reference(
        &self,
        tax_year: i32,
    ) -> Result<&TaxReference, CalculationError> {
        self.references
            .get(&tax_year)
            .map(Arc::as_ref)
            .ok_or(CalculationError::UnsupportedTaxYear(tax_year))
    }

    /// Runs the full pipeline for one filing.
    ///
    /// # Errors
    ///
    /// Unsupported tax year, unknown canton, a secondary filing without a
    /// property in its canton, invalid social-security input, or amounts
    /// whose sums leave the range of [`Decimal`].
    pub fn calculate(
        &self,
        filing: &Filing,
    ) -> Result<CalculationResult, CalculationError> {
        let reference = self.reference(filing.tax_year)?;
        let config = &reference.config;
        let canton = &filing.canton;
        let canton_calculator = reference.cantons.calculator(canton, filing.tax_year)?;
        let profile = &filing.profile;
        let scope = FilingScope::of(filing);

        if let FilingScope::Secondary { canton } = scope {
            if profile.properties_in(canton).next().is_none() {
                return Err(CalculationError::SecondaryWithoutProperty {
                    filing_id: filing.id,
                    canton: canton.clone(),
                });
            }
        }

        let mut warnings = Vec::new();

        if scope.is_primary() {
            if let Some(residence) = profile.canton.as_ref().filter(|c| *c != canton) {
                warn!(filing_id = filing.id, %canton, %residence, "primary filing is not in the residence canton");
                warnings.push(format!("primary filing is in {canton} but the residence canton is {residence}"));
            }
        }

        let income = IncomeBreakdown::aggregate(profile, scope)?;
        debug!(filing_id = filing.id, total = %income.total, "income aggregated");

        let (social_security, self_employed_social_security) = if scope.is_primary() {
            social_security(config, profile)?
        } else {
            (None, None)
        };
        let deductible_contributions = social_security
            .as_ref()
            .map_or(Decimal::ZERO, |s| s.tax_deductible_employee);

        let deductions = DeductionCalculator::new(&config.deductions).calculate(
            profile,
            &income,
            scope,
            deductible_contributions,
        )?;
        let taxable_income = round_half_up(non_negative(income.total - deductions.total));
        debug!(filing_id = filing.id, deductions = %deductions.total, %taxable_income, "taxable income");

        let federal_tax = if scope.is_primary() {
            FederalTaxCalculator::new(&reference.federal).calculate(taxable_income, profile.marital_status)?
        } else {
            Decimal::ZERO
        };

        let cantonal = cantonal_with_fallback(&canton_calculator, config, taxable_income, profile)
            .collect_into(&mut warnings);

        let municipal = reference
            .municipal
            .calculate(
                cantonal.total_tax,
                filing.tax_year,
                canton,
                municipality_for(filing),
                config.default_municipal_multiplier,
            )
            .collect_into(&mut warnings);

        let church = ChurchTaxService::new(&reference.church).calculate(
            cantonal.total_tax,
            canton,
            profile.pays_church_tax,
            profile.denomination.as_deref(),
        );

        let wealth = (scope.is_primary() && profile.has_wealth).then(|| {
            WealthTaxService::new(&reference.wealth).calculate_or_record(
                canton,
                profile.marital_status,
                profile.net_wealth,
            )
        });
        if let Some(error) = wealth.as_ref().and_then(|w| w.error.as_ref()) {
            warnings.push(format!("wealth tax not computed: {error}"));
        }
        let wealth_tax = wealth.as_ref().map_or(Decimal::ZERO, |w| w.wealth_tax);

        let total_tax = checked_sum([federal_tax, cantonal.total_tax, municipal.amount, church.amount, wealth_tax])
            .ok_or(CalculationError::AmountOverflow("total tax"))?;

        debug!(
            filing_id = filing.id,
            %canton,
            %federal_tax,
            cantonal_tax = %cantonal.total_tax,
            municipal_tax = %municipal.amount,
            %total_tax,
            "filing calculated"
        );

        Ok(CalculationResult {
            filing_id: filing.id,
            tax_year: filing.tax_year,
            canton: canton.clone(),
            is_primary: filing.is_primary,
            taxable_income,
            federal_tax,
            cantonal_tax: cantonal.total_tax,
            municipal_tax: municipal.amount,
            church_tax: church.amount,
            wealth_tax,
            total_tax,
            effective_rate: round_rate(ratio_or_zero(total_tax, income.total)),
            monthly_tax: round_half_up(total_tax / MONTHS_PER_YEAR),
            income,
            deductions,
            cantonal,
            municipal,
            church,
            wealth,
            social_security,
            self_employed_social_security,
            warnings,
        })
    }

    /// Calculates a filing and appends the result to `store`.
    pub async fn calculate_and_store(
        &self,
        store: &dyn CalculationStore,
        filing: &Filing,
    ) -> Result<CalculationResult, CalculationError> {
        let result = self.calculate(filing)?;
        store_result(store, &result).await?;
        Ok(result)
    }

    /// Most recent stored result of a filing, if any.
    pub async fn get_tax_summary(
        &self,
        store: &dyn CalculationStore,
        filing_id: FilingId,
    ) -> Result<Option<CalculationResult>, CalculationError> {
        let Some(snapshot) = store.get(filing_id).await? else {
            return Ok(None);
        };

        serde_json::from_value(snapshot)
            .map(Some)
            .map_err(|source| CalculationError::CorruptSnapshot { filing_id, source })
    }
}

pub(crate) async fn store_result(
    store: &dyn CalculationStore,
    result: &CalculationResult,
) -> Result<(), CalculationError> {
    let breakdown = serde_json::to_value(result).map_err(|source| CalculationError::SnapshotEncoding {
        filing_id: result.filing_id,
        source,
    })?;
    store.insert(result.filing_id, &breakdown).await?;
    Ok(())
}

type SocialSecurityPair = (Option<SocialSecuritySummary>, Option<SocialSecuritySummary>);

fn social_security(
    config: &TaxYearConfig,
    profile: &TaxProfile,
) -> Result<SocialSecurityPair, CalculationError> {
    let calculator = SocialSecurityCalculator::new(&config.social_security);
    let age = profile.age.unwrap_or_default();

    let employed = if profile.income.employment > Decimal::ZERO {
        Some(calculator.calculate_employed(
            profile.income.employment,
            age,
            profile.employment.work_percentage,
            profile.employment.nbu_rate,
        )?)
    } else {
        None
    };

    let self_employed = if profile.income.self_employment > Decimal::ZERO {
        Some(calculator.calculate_self_employed(profile.income.self_employment, age)?)
    } else {
        None
    };

    Ok((employed, self_employed))
}

fn cantonal_with_fallback(
    calculator: &CantonTaxCalculator<'_>,
    config: &TaxYearConfig,
    taxable_income: Decimal,
    profile: &TaxProfile,
) -> Computed<CantonTaxBreakdown> {
    match calculator.calculate_breakdown(taxable_income, profile.marital_status, profile.num_children) {
        Ok(breakdown) => Computed::ok(breakdown),
        Err(e) => {
            let rate = config.fallback_cantonal_rate;
            warn!(
                canton = %calculator.canton(),
                %taxable_income,
                error = %e,
                %rate,
                "canton calculator failed; using flat fallback rate"
            );
            Computed::with_warning(
                CantonTaxBreakdown::flat_rate(
                    calculator.canton().clone(),
                    config.tax_year,
                    taxable_income,
                    profile.marital_status,
                    profile.num_children,
                    rate,
                ),
                format!("cantonal tax for {} estimated at flat rate {rate}: {e}", calculator.canton()),
            )
        }
    }
}

/// The primary filing uses the residence municipality; a secondary filing
/// uses the municipality of its first property that names one.
fn municipality_for(filing: &Filing) -> Option<&str> {
    if filing.is_primary {
        filing.profile.municipality.as_deref()
    } else {
        filing
            .profile
            .properties_in(&filing.canton)
            .find_map(|p| p.municipality.as_deref())
    }
}
