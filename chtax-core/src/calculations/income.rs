use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;
use crate::calculations::common::checked_sum;
use crate::models::{CantonCode, Filing, PropertyEntry, TaxProfile};

/// What part of a taxpayer's situation a filing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingScope<'a> {
    /// Residence canton: all income, all deductions.
    Primary,
    /// Another canton: only property located there.
    Secondary { canton: &'a CantonCode },
}

impl<'a> FilingScope<'a> {
    pub fn of(filing: &'a Filing) -> Self {
        if filing.is_primary {
            Self::Primary
        } else {
            Self::Secondary { canton: &filing.canton }
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }

    /// Properties whose income and costs belong to this scope.
    pub fn properties(
        &self,
        profile: &'a TaxProfile,
    ) -> Box<dyn Iterator<Item = &'a PropertyEntry> + 'a> {
        match *self {
            Self::Primary => Box::new(profile.properties.iter()),
            Self::Secondary { canton } => Box::new(profile.properties_in(canton)),
        }
    }
}

/// Income per source for one filing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub employment: Decimal,
    pub self_employment: Decimal,
    pub capital: Decimal,
    pub rental: Decimal,
    pub pension: Decimal,
    pub foreign: Decimal,
    pub other: Decimal,
    pub total: Decimal,
}

impl IncomeBreakdown {
    /// Aggregates the income a filing is assessed on.
    ///
    /// The primary filing sees every source, with rental income from all
    /// listed properties added to the answered rental income. A secondary
    /// filing sees only the rental income of properties in its canton.
    ///
    /// # Errors
    ///
    /// [`CalculationError::AmountOverflow`] when a sum is not representable.
    pub fn aggregate(
        profile: &TaxProfile,
        scope: FilingScope<'_>,
    ) -> Result<Self, CalculationError> {
        let property_rental = checked_sum(scope.properties(profile).map(|p| p.annual_rental_income))
            .ok_or(CalculationError::AmountOverflow("property rental income"))?;

        let mut income = match scope {
            FilingScope::Primary => {
                let sources = &profile.income;
                Self {
                    employment: sources.employment,
                    self_employment: sources.self_employment,
                    capital: sources.capital,
                    rental: sources
                        .rental
                        .checked_add(property_rental)
                        .ok_or(CalculationError::AmountOverflow("rental income"))?,
                    pension: sources.pension,
                    foreign: sources.foreign,
                    other: sources.other,
                    total: Decimal::ZERO,
                }
            }
            FilingScope::Secondary { .. } => Self {
                rental: property_rental,
                ..Self::default()
            },
        };

        income.total = checked_sum([
            income.employment,
            income.self_employment,
            income.capital,
            income.rental,
            income.pension,
            income.foreign,
            income.other,
        ])
        .ok_or(CalculationError::AmountOverflow("total income"))?;
        Ok(income)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::IncomeSources;

    fn property(
        canton: &str,
        rental: Decimal,
    ) -> PropertyEntry {
        PropertyEntry {
            canton: CantonCode::from(canton),
            municipality: None,
            annual_rental_income: rental,
            mortgage_interest: dec!(1000),
            maintenance_costs: dec!(500),
        }
    }

    fn profile() -> TaxProfile {
        TaxProfile {
            income: IncomeSources {
                employment: dec!(90000),
                capital: dec!(1200),
                rental: dec!(3000),
                pension: dec!(0),
                ..IncomeSources::default()
            },
            properties: vec![property("GE", dec!(18000)), property("VS", dec!(6000))],
            ..TaxProfile::default()
        }
    }

    #[test]
    fn primary_sums_every_source_and_all_properties() {
        let income = IncomeBreakdown::aggregate(&profile(), FilingScope::Primary).unwrap();

        assert_eq!(income.employment, dec!(90000));
        assert_eq!(income.rental, dec!(27000));
        assert_eq!(income.total, dec!(118200));
    }

    #[test]
    fn secondary_only_sees_properties_in_its_canton() {
        let ge = CantonCode::from("GE");

        let income = IncomeBreakdown::aggregate(&profile(), FilingScope::Secondary { canton: &ge }).unwrap();

        assert_eq!(
            income,
            IncomeBreakdown {
                rental: dec!(18000),
                total: dec!(18000),
                ..IncomeBreakdown::default()
            }
        );
    }

    #[test]
    fn secondary_without_property_has_no_income() {
        let be = CantonCode::from("BE");

        let income = IncomeBreakdown::aggregate(&profile(), FilingScope::Secondary { canton: &be }).unwrap();

        assert_eq!(income.total, dec!(0));
    }

    #[test]
    fn unrepresentable_total_is_an_error() {
        let mut profile = profile();
        profile.income.employment = dec!(50000000000000000000000000000);
        profile.income.pension = dec!(50000000000000000000000000000);

        let err = IncomeBreakdown::aggregate(&profile, FilingScope::Primary).unwrap_err();

        assert!(matches!(err, CalculationError::AmountOverflow("total income")));
    }
}
