//! Cantonal income tax.
//!
//! The 26 cantons differ in their bracket tables and in two further
//! dimensions: how children reduce the tax ([`FamilyAdjustment`]) and how
//! household income is assessed ([`AssessmentMethod`]). A canton is a row of
//! data, a [`CantonRule`], kept in a [`CantonRegistry`]; one generic
//! [`CantonTaxCalculator`] evaluates any rule.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use chtax_core::calculations::{AssessmentMethod, CantonRegistry, CantonRule, FamilyAdjustment};
//! use chtax_core::{CantonCode, JurisdictionTaxTable, MaritalStatus, TaxBracket};
//!
//! let tables = JurisdictionTaxTable::single_schedule(vec![
//!     TaxBracket::new(dec!(0), Some(dec!(10000)), dec!(0), dec!(0)),
//!     TaxBracket::new(dec!(10000), None, dec!(0.05), dec!(0)),
//! ])
//! .unwrap();
//!
//! let mut registry = CantonRegistry::new();
//! registry.insert(CantonRule {
//!     code: CantonCode::from("XY"),
//!     name: "Example".to_string(),
//!     tables,
//!     family_adjustment: FamilyAdjustment::PercentPerChild { rate: dec!(0.02), cap: dec!(0.10) },
//!     method: AssessmentMethod::Brackets,
//! });
//!
//! let calculator = registry.calculator(&CantonCode::from("XY"), 2024).unwrap();
//! // 2'000 before the 4% reduction for two children.
//! assert_eq!(calculator.calculate(dec!(50000), MaritalStatus::Single, 2).unwrap(), dec!(1920.00));
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::CalculationError;
use crate::calculations::common::{ratio_or_zero, round_half_up, round_rate};
use crate::models::{CantonCode, JurisdictionTaxTable, MaritalStatus};

/// Errors a canton calculator can report. The pipeline recovers from all of
/// them with the flat fallback rate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CantonTaxError {
    #[error("canton {canton} has no {status} brackets")]
    NoBrackets { canton: CantonCode, status: MaritalStatus },

    #[error("canton {canton} has no bracket containing {income}")]
    NoMatchingBracket { canton: CantonCode, income: Decimal },

    #[error("canton {canton} household quotient {factor} is not positive")]
    InvalidQuotient { canton: CantonCode, factor: Decimal },
}

/// How the number of children reduces the computed tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FamilyAdjustment {
    #[default]
    None,
    /// Reduce by `rate` per child, at most by `cap` in total.
    PercentPerChild { rate: Decimal, cap: Decimal },
}

impl FamilyAdjustment {
    pub fn apply(
        &self,
        tax: Decimal,
        num_children: u32,
    ) -> Decimal {
        match *self {
            Self::None => tax,
            Self::PercentPerChild { rate, cap } => {
                let reduction = (rate * Decimal::from(num_children)).min(cap);
                tax * (Decimal::ONE - reduction)
            }
        }
    }
}

/// How taxable income is turned into a bracket lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentMethod {
    /// Look the income up directly.
    #[default]
    Brackets,
    /// Divide income by a household factor, price one unit, multiply back.
    HouseholdQuotient {
        single: Decimal,
        married: Decimal,
        per_child: Decimal,
    },
}

impl AssessmentMethod {
    /// Household factor, `None` for direct bracket lookup.
    pub fn quotient(
        &self,
        status: MaritalStatus,
        num_children: u32,
    ) -> Option<Decimal> {
        match *self {
            Self::Brackets => None,
            Self::HouseholdQuotient {
                single,
                married,
                per_child,
            } => {
                let base = match status {
                    MaritalStatus::Single => single,
                    MaritalStatus::Married => married,
                };
                Some(base + per_child * Decimal::from(num_children))
            }
        }
    }
}

/// Everything that distinguishes one canton's income tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CantonRule {
    pub code: CantonCode,
    pub name: String,
    pub tables: JurisdictionTaxTable,
    pub family_adjustment: FamilyAdjustment,
    pub method: AssessmentMethod,
}

/// Canton rules of one tax year, keyed by canton code.
#[derive(Debug, Clone, Default)]
pub struct CantonRegistry {
    rules: BTreeMap<CantonCode, CantonRule>,
}

impl CantonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, returning the one it replaced.
    pub fn insert(
        &mut self,
        rule: CantonRule,
    ) -> Option<CantonRule> {
        self.rules.insert(rule.code.clone(), rule)
    }

    pub fn get(
        &self,
        code: &CantonCode,
    ) -> Option<&CantonRule> {
        self.rules.get(code)
    }

    pub fn contains(
        &self,
        code: &CantonCode,
    ) -> bool {
        self.rules.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &CantonCode> {
        self.rules.keys()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Calculator for `code`.
    ///
    /// # Errors
    ///
    /// [`CalculationError::UnknownCanton`] when no rule is registered.
    pub fn calculator(
        &self,
        code: &CantonCode,
        tax_year: i32,
    ) -> Result<CantonTaxCalculator<'_>, CalculationError> {
        self.get(code)
            .map(|rule| CantonTaxCalculator::new(rule, tax_year))
            .ok_or_else(|| CalculationError::UnknownCanton(code.clone()))
    }
}

/// Uniform breakdown returned for every canton, whatever its rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantonTaxBreakdown {
    pub canton: CantonCode,
    pub tax_year: i32,
    pub taxable_income: Decimal,
    pub marital_status: MaritalStatus,
    pub num_children: u32,
    pub total_tax: Decimal,
    pub marginal_rate: Decimal,
    pub effective_rate: Decimal,
    /// Set when the canton's rule could not be applied and a flat rate was
    /// used instead.
    #[serde(default)]
    pub fallback: bool,
}

impl CantonTaxBreakdown {
    /// Breakdown for a flat-rate fallback assessment.
    pub fn flat_rate(
        canton: CantonCode,
        tax_year: i32,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
        num_children: u32,
        rate: Decimal,
    ) -> Self {
        let total_tax = if taxable_income <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            round_half_up(taxable_income * rate)
        };
        Self {
            canton,
            tax_year,
            taxable_income,
            marital_status,
            num_children,
            total_tax,
            marginal_rate: rate,
            effective_rate: round_rate(ratio_or_zero(total_tax, taxable_income)),
            fallback: true,
        }
    }
}

/// Evaluates one [`CantonRule`].
#[derive(Debug, Clone, Copy)]
pub struct CantonTaxCalculator<'a> {
    rule: &'a CantonRule,
    tax_year: i32,
}

impl<'a> CantonTaxCalculator<'a> {
    pub fn new(
        rule: &'a CantonRule,
        tax_year: i32,
    ) -> Self {
        Self { rule, tax_year }
    }

    pub fn canton(&self) -> &CantonCode {
        &self.rule.code
    }

    /// Cantonal tax on `taxable_income`, rounded to centimes.
    ///
    /// # Errors
    ///
    /// See [`CantonTaxError`].
    pub fn calculate(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
        num_children: u32,
    ) -> Result<Decimal, CantonTaxError> {
        if taxable_income <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let raw = match self.rule.method.quotient(marital_status, num_children) {
            None => self.scan(taxable_income, marital_status)?,
            Some(factor) if factor <= Decimal::ZERO => {
                return Err(CantonTaxError::InvalidQuotient {
                    canton: self.rule.code.clone(),
                    factor,
                });
            }
            Some(factor) => self.scan(taxable_income / factor, marital_status)? * factor,
        };

        let adjusted = self.rule.family_adjustment.apply(raw, num_children);
        Ok(round_half_up(adjusted))
    }

    /// Rate of the bracket that prices the next franc of income. Zero for
    /// non-positive income or when no bracket applies.
    pub fn get_marginal_rate(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
    ) -> Decimal {
        self.marginal_rate_for(taxable_income, marital_status, 0)
    }

    fn marginal_rate_for(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
        num_children: u32,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let lookup_income = match self.rule.method.quotient(marital_status, num_children) {
            Some(factor) if factor > Decimal::ZERO => taxable_income / factor,
            _ => taxable_income,
        };

        self.rule
            .tables
            .find_bracket(marital_status, lookup_income)
            .map_or(Decimal::ZERO, |b| b.rate)
    }

    pub fn calculate_breakdown(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
        num_children: u32,
    ) -> Result<CantonTaxBreakdown, CantonTaxError> {
        let total_tax = self.calculate(taxable_income, marital_status, num_children)?;

        Ok(CantonTaxBreakdown {
            canton: self.rule.code.clone(),
            tax_year: self.tax_year,
            taxable_income,
            marital_status,
            num_children,
            total_tax,
            marginal_rate: self.marginal_rate_for(taxable_income, marital_status, num_children),
            effective_rate: round_rate(ratio_or_zero(total_tax, taxable_income)),
            fallback: false,
        })
    }

    fn scan(
        &self,
        income: Decimal,
        marital_status: MaritalStatus,
    ) -> Result<Decimal, CantonTaxError> {
        if self.rule.tables.brackets(marital_status).is_empty() {
            return Err(CantonTaxError::NoBrackets {
                canton: self.rule.code.clone(),
                status: marital_status,
            });
        }

        self.rule
            .tables
            .tax_for(marital_status, income)
            .ok_or_else(|| CantonTaxError::NoMatchingBracket {
                canton: self.rule.code.clone(),
                income,
            })
    }
}
