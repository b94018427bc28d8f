//! Mandatory Swiss social insurance contributions.
//!
//! Four schemes are levied on employment income:
//!
//! | Scheme  | Base                           | Split              | Deductible |
//! |---------|--------------------------------|--------------------|------------|
//! | AHV/IV/EO | full salary, no ceiling      | half / half        | no         |
//! | ALV     | salary to ceiling + solidarity | half / half        | no         |
//! | UVG-NBU | full salary                    | employee only      | no         |
//! | BVG     | coordinated salary             | same rate each     | employee   |
//!
//! Self-employed income pays AHV only, on a sliding scale.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! # use chtax_core::{AhvConfig, AlvConfig, BvgAgeBand, BvgConfig, NbuConfig, SelfEmployedAhvConfig, SocialSecurityConfig};
//! use chtax_core::calculations::SocialSecurityCalculator;
//! # let config = SocialSecurityConfig {
//! #     ahv: AhvConfig { employee_rate: dec!(0.053), employer_rate: dec!(0.053) },
//! #     alv: AlvConfig { total_rate: dec!(0.011), ceiling: dec!(148200), solidarity_total_rate: dec!(0.005) },
//! #     nbu: NbuConfig { default_rate: dec!(0.016), min_rate: dec!(0.007), max_rate: dec!(0.03), min_work_percentage: dec!(20) },
//! #     bvg: BvgConfig {
//! #         entry_threshold: dec!(22050), coordination_deduction: dec!(25725),
//! #         min_coordinated_salary: dec!(3675), max_coordinated_salary: dec!(88200),
//! #         age_bands: vec![BvgAgeBand { from_age: 25, to_age: 34, rate: dec!(0.07) }],
//! #     },
//! #     self_employed: SelfEmployedAhvConfig {
//! #         low_income_limit: dec!(9800), low_income_rate: dec!(0.05371),
//! #         mid_income_limit: dec!(58800), mid_income_contribution: dec!(4000), high_income_rate: dec!(0.10),
//! #     },
//! # };
//!
//! let calculator = SocialSecurityCalculator::new(&config);
//! let summary = calculator.calculate_employed(dec!(80000), 30, dec!(100), None).unwrap();
//!
//! assert_eq!(summary.tax_deductible_employee, dec!(3799.25));
//! ```

mod ahv;
mod alv;
mod bvg;
mod uvg;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{percent_to_fraction, ratio_or_zero, round_rate};
use crate::models::SocialSecurityConfig;

/// Invalid input to a social-security calculation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocialSecurityError {
    #[error("income must not be negative, got {0}")]
    NegativeIncome(Decimal),

    #[error("work percentage must be in (0, 100], got {0}")]
    InvalidWorkPercentage(Decimal),

    #[error("NBU rate {rate} lies outside [{min}, {max}]")]
    InvalidNbuRate {
        rate: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Ahv,
    Alv,
    UvgNbu,
    Bvg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentKind {
    Employed,
    SelfEmployed,
}

/// One scheme's contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityContribution {
    pub scheme: Scheme,
    pub applicable: bool,
    /// Amount the rate is applied to (coordinated salary for BVG).
    pub base: Decimal,
    pub employee: Decimal,
    pub employer: Decimal,
    pub is_tax_deductible: bool,
    pub note: Option<String>,
}

impl SocialSecurityContribution {
    pub(crate) fn not_applicable(
        scheme: Scheme,
        note: impl Into<String>,
    ) -> Self {
        Self {
            scheme,
            applicable: false,
            base: Decimal::ZERO,
            employee: Decimal::ZERO,
            employer: Decimal::ZERO,
            is_tax_deductible: false,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecuritySummary {
    pub kind: EmploymentKind,
    pub gross_income: Decimal,
    /// Gross income scaled by the work percentage.
    pub adjusted_income: Decimal,
    pub contributions: Vec<SocialSecurityContribution>,
    pub total_employee_contributions: Decimal,
    pub total_employer_contributions: Decimal,
    pub tax_deductible_employee: Decimal,
    pub net_salary_after_contributions: Decimal,
    pub effective_rate_employee: Decimal,
}

impl SocialSecuritySummary {
    fn from_contributions(
        kind: EmploymentKind,
        gross_income: Decimal,
        adjusted_income: Decimal,
        contributions: Vec<SocialSecurityContribution>,
    ) -> Self {
        let total_employee_contributions = contributions.iter().map(|c| c.employee).sum::<Decimal>();
        let total_employer_contributions = contributions.iter().map(|c| c.employer).sum::<Decimal>();
        let tax_deductible_employee = contributions
            .iter()
            .filter(|c| c.is_tax_deductible)
            .map(|c| c.employee)
            .sum::<Decimal>();

        Self {
            kind,
            gross_income,
            adjusted_income,
            contributions,
            total_employee_contributions,
            total_employer_contributions,
            tax_deductible_employee,
            net_salary_after_contributions: adjusted_income - total_employee_contributions,
            effective_rate_employee: round_rate(ratio_or_zero(total_employee_contributions, adjusted_income)),
        }
    }

    pub fn contribution(
        &self,
        scheme: Scheme,
    ) -> Option<&SocialSecurityContribution> {
        self.contributions.iter().find(|c| c.scheme == scheme)
    }
}

/// Computes contributions from the year's [`SocialSecurityConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SocialSecurityCalculator<'a> {
    config: &'a SocialSecurityConfig,
}

impl<'a> SocialSecurityCalculator<'a> {
    pub fn new(config: &'a SocialSecurityConfig) -> Self {
        Self { config }
    }

    /// Contributions on an employee's salary.
    ///
    /// `work_percentage` is a whole percentage; the salary is scaled by it
    /// before any scheme is applied.
    ///
    /// # Errors
    ///
    /// [`SocialSecurityError`] for a negative salary, a work percentage
    /// outside `(0, 100]` or a supplied NBU rate outside the legal range.
    pub fn calculate_employed(
        &self,
        gross_salary: Decimal,
        age: u32,
        work_percentage: Decimal,
        nbu_rate: Option<Decimal>,
    ) -> Result<SocialSecuritySummary, SocialSecurityError> {
        if gross_salary < Decimal::ZERO {
            return Err(SocialSecurityError::NegativeIncome(gross_salary));
        }
        if work_percentage <= Decimal::ZERO || work_percentage > Decimal::ONE_HUNDRED {
            return Err(SocialSecurityError::InvalidWorkPercentage(work_percentage));
        }

        let adjusted_salary = gross_salary * percent_to_fraction(work_percentage);

        let contributions = vec![
            ahv::employed(&self.config.ahv, adjusted_salary),
            alv::employed(&self.config.alv, adjusted_salary),
            uvg::non_occupational(&self.config.nbu, adjusted_salary, work_percentage, nbu_rate)?,
            bvg::occupational(&self.config.bvg, adjusted_salary, age, work_percentage),
        ];

        Ok(SocialSecuritySummary::from_contributions(
            EmploymentKind::Employed,
            gross_salary,
            adjusted_salary,
            contributions,
        ))
    }

    /// AHV on self-employed net income. The other schemes are voluntary for
    /// the self-employed and reported as not applicable.
    pub fn calculate_self_employed(
        &self,
        net_income: Decimal,
        _age: u32,
    ) -> Result<SocialSecuritySummary, SocialSecurityError> {
        if net_income < Decimal::ZERO {
            return Err(SocialSecurityError::NegativeIncome(net_income));
        }

        let voluntary = "voluntary for the self-employed; not included";
        let contributions = vec![
            ahv::self_employed(&self.config.self_employed, net_income),
            SocialSecurityContribution::not_applicable(Scheme::Alv, "self-employed persons are not insured against unemployment"),
            SocialSecurityContribution::not_applicable(Scheme::UvgNbu, voluntary),
            SocialSecurityContribution::not_applicable(Scheme::Bvg, voluntary),
        ];

        Ok(SocialSecuritySummary::from_contributions(
            EmploymentKind::SelfEmployed,
            net_income,
            net_income,
            contributions,
        ))
    }
}
