use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors found when validating a [`TaxYearConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxYearConfigError {
    #[error("{name} must be a fraction between 0 and 1, got {value}")]
    RateOutOfRange { name: &'static str, value: Decimal },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: Decimal },

    #[error("NBU default rate {default} lies outside [{min}, {max}]")]
    NbuDefaultOutOfRange {
        default: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("BVG age band {from_age}-{to_age} is empty or overlaps the previous band")]
    InvalidAgeBand { from_age: u32, to_age: u32 },

    #[error("BVG coordinated salary bounds are inverted: {min} > {max}")]
    InvertedCoordinatedBounds { min: Decimal, max: Decimal },
}

/// Constants of one tax year that are not bracket tables.
///
/// Loaded once per year and passed explicitly into the calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    /// Flat rate applied to taxable income when a canton calculator fails.
    pub fallback_cantonal_rate: Decimal,
    /// Multiplier used when no municipal multiplier is known.
    pub default_municipal_multiplier: Decimal,
    pub social_security: SocialSecurityConfig,
    pub deductions: DeductionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityConfig {
    pub ahv: AhvConfig,
    pub alv: AlvConfig,
    pub nbu: NbuConfig,
    pub bvg: BvgConfig,
    pub self_employed: SelfEmployedAhvConfig,
}

/// AHV/IV/EO, flat and uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AhvConfig {
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
}

/// ALV, two tiers split by the annual ceiling. Rates are totals, shared
/// evenly between employer and employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlvConfig {
    pub total_rate: Decimal,
    pub ceiling: Decimal,
    pub solidarity_total_rate: Decimal,
}

/// Non-occupational accident insurance, employee only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbuConfig {
    pub default_rate: Decimal,
    pub min_rate: Decimal,
    pub max_rate: Decimal,
    /// Minimum work percentage (e.g. `20`) for NBU to be mandatory.
    pub min_work_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BvgConfig {
    pub entry_threshold: Decimal,
    pub coordination_deduction: Decimal,
    pub min_coordinated_salary: Decimal,
    pub max_coordinated_salary: Decimal,
    pub age_bands: Vec<BvgAgeBand>,
}

/// Contribution rate per party for ages `from_age..=to_age`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BvgAgeBand {
    pub from_age: u32,
    pub to_age: u32,
    pub rate: Decimal,
}

impl BvgConfig {
    pub fn min_age(&self) -> Option<u32> {
        self.age_bands.iter().map(|b| b.from_age).min()
    }

    /// Rate for `age`, zero outside every band.
    pub fn rate_for_age(
        &self,
        age: u32,
    ) -> Decimal {
        self.age_bands
            .iter()
            .find(|b| (b.from_age..=b.to_age).contains(&age))
            .map_or(Decimal::ZERO, |b| b.rate)
    }
}

/// Sliding scale for self-employed AHV contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmployedAhvConfig {
    pub low_income_limit: Decimal,
    pub low_income_rate: Decimal,
    pub mid_income_limit: Decimal,
    pub mid_income_contribution: Decimal,
    pub high_income_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionConfig {
    pub professional_expense_rate: Decimal,
    pub professional_expense_max: Decimal,
    pub pillar_3a_max: Decimal,
    pub insurance_premium_single: Decimal,
    pub insurance_premium_married: Decimal,
    pub child_deduction: Decimal,
    /// Share of total income medical expenses must exceed to count.
    pub medical_expense_threshold_rate: Decimal,
    pub general_deduction: Decimal,
}

impl TaxYearConfig {
    /// Checks every rate is a fraction and every limit is positive.
    pub fn validate(&self) -> Result<(), TaxYearConfigError> {
        let ss = &self.social_security;
        let d = &self.deductions;

        for (name, value) in [
            ("fallback_cantonal_rate", self.fallback_cantonal_rate),
            ("ahv.employee_rate", ss.ahv.employee_rate),
            ("ahv.employer_rate", ss.ahv.employer_rate),
            ("alv.total_rate", ss.alv.total_rate),
            ("alv.solidarity_total_rate", ss.alv.solidarity_total_rate),
            ("nbu.default_rate", ss.nbu.default_rate),
            ("nbu.min_rate", ss.nbu.min_rate),
            ("nbu.max_rate", ss.nbu.max_rate),
            ("self_employed.low_income_rate", ss.self_employed.low_income_rate),
            ("self_employed.high_income_rate", ss.self_employed.high_income_rate),
            ("deductions.professional_expense_rate", d.professional_expense_rate),
            ("deductions.medical_expense_threshold_rate", d.medical_expense_threshold_rate),
        ] {
            check_fraction(name, value)?;
        }

        for (name, value) in [
            ("default_municipal_multiplier", self.default_municipal_multiplier),
            ("alv.ceiling", ss.alv.ceiling),
            ("bvg.entry_threshold", ss.bvg.entry_threshold),
            ("bvg.max_coordinated_salary", ss.bvg.max_coordinated_salary),
            ("self_employed.low_income_limit", ss.self_employed.low_income_limit),
            ("self_employed.mid_income_limit", ss.self_employed.mid_income_limit),
            ("deductions.pillar_3a_max", d.pillar_3a_max),
        ] {
            if value <= Decimal::ZERO {
                return Err(TaxYearConfigError::NotPositive { name, value });
            }
        }

        if ss.nbu.default_rate < ss.nbu.min_rate || ss.nbu.default_rate > ss.nbu.max_rate {
            return Err(TaxYearConfigError::NbuDefaultOutOfRange {
                default: ss.nbu.default_rate,
                min: ss.nbu.min_rate,
                max: ss.nbu.max_rate,
            });
        }

        if ss.bvg.min_coordinated_salary > ss.bvg.max_coordinated_salary {
            return Err(TaxYearConfigError::InvertedCoordinatedBounds {
                min: ss.bvg.min_coordinated_salary,
                max: ss.bvg.max_coordinated_salary,
            });
        }

        let mut previous_to: Option<u32> = None;
        for band in &ss.bvg.age_bands {
            let overlaps = previous_to.is_some_and(|to| band.from_age <= to);
            if band.from_age > band.to_age || overlaps {
                return Err(TaxYearConfigError::InvalidAgeBand {
                    from_age: band.from_age,
                    to_age: band.to_age,
                });
            }
            check_fraction("bvg.age_bands.rate", band.rate)?;
            previous_to = Some(band.to_age);
        }

        Ok(())
    }
}

fn check_fraction(
    name: &'static str,
    value: Decimal,
) -> Result<(), TaxYearConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TaxYearConfigError::RateOutOfRange { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::test_support::test_year_config;

    #[test]
    fn validate_accepts_statutory_values() {
        assert_eq!(test_year_config().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let mut config = test_year_config();
        config.fallback_cantonal_rate = dec!(8);

        assert_eq!(
            config.validate(),
            Err(TaxYearConfigError::RateOutOfRange {
                name: "fallback_cantonal_rate",
                value: dec!(8),
            })
        );
    }

    #[test]
    fn validate_rejects_non_positive_ceiling() {
        let mut config = test_year_config();
        config.social_security.alv.ceiling = Decimal::ZERO;

        assert!(matches!(
            config.validate(),
            Err(TaxYearConfigError::NotPositive { name: "alv.ceiling", .. })
        ));
    }

    #[test]
    fn validate_rejects_nbu_default_outside_range() {
        let mut config = test_year_config();
        config.social_security.nbu.default_rate = dec!(0.05);

        assert!(matches!(
            config.validate(),
            Err(TaxYearConfigError::NbuDefaultOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_overlapping_age_bands() {
        let mut config = test_year_config();
        config.social_security.bvg.age_bands[1].from_age = 30;

        assert_eq!(
            config.validate(),
            Err(TaxYearConfigError::InvalidAgeBand {
                from_age: 30,
                to_age: 44,
            })
        );
    }

    #[test]
    fn rate_for_age_follows_bands() {
        let bvg = test_year_config().social_security.bvg;

        assert_eq!(bvg.rate_for_age(24), Decimal::ZERO);
        assert_eq!(bvg.rate_for_age(25), dec!(0.07));
        assert_eq!(bvg.rate_for_age(44), dec!(0.10));
        assert_eq!(bvg.rate_for_age(50), dec!(0.15));
        assert_eq!(bvg.rate_for_age(65), dec!(0.18));
        assert_eq!(bvg.rate_for_age(66), Decimal::ZERO);
        assert_eq!(bvg.min_age(), Some(25));
    }
}
