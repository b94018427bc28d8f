use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{MaritalStatus, TaxBracket};

/// Structural problems detected while building a [`JurisdictionTaxTable`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxTableError {
    #[error("{0} schedule has no brackets")]
    Empty(MaritalStatus),

    #[error("{status} schedule starts at {min} instead of 0")]
    DoesNotStartAtZero { status: MaritalStatus, min: Decimal },

    #[error("{status} schedule has a gap between {upper} and {next_min}")]
    Gap {
        status: MaritalStatus,
        upper: Decimal,
        next_min: Decimal,
    },

    #[error("{status} schedule has overlapping brackets at {upper} / {next_min}")]
    Overlap {
        status: MaritalStatus,
        upper: Decimal,
        next_min: Decimal,
    },

    #[error("{status} schedule has an unbounded bracket at {min} that is not the last one")]
    UnboundedBeforeEnd { status: MaritalStatus, min: Decimal },

    #[error("{0} schedule has no unbounded top bracket")]
    MissingTopBracket(MaritalStatus),

    #[error("{status} schedule has a negative rate {rate}")]
    NegativeRate { status: MaritalStatus, rate: Decimal },

    #[error("table has no single schedule")]
    MissingSingleSchedule,
}

/// Progressive schedules of one jurisdiction, one bracket list per marital
/// status.
///
/// Every schedule is sorted, contiguous, starts at zero and ends with exactly
/// one unbounded bracket. A table may omit the married schedule; lookups for
/// married taxpayers then fall back to the single schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionTaxTable {
    schedules: BTreeMap<MaritalStatus, Vec<TaxBracket>>,
}

impl JurisdictionTaxTable {
    /// Validates and builds a table. Brackets are sorted by `min_income`
    /// before validation.
    pub fn new(mut schedules: BTreeMap<MaritalStatus, Vec<TaxBracket>>) -> Result<Self, TaxTableError> {
        if !schedules.contains_key(&MaritalStatus::Single) {
            return Err(TaxTableError::MissingSingleSchedule);
        }

        for (status, brackets) in schedules.iter_mut() {
            brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            validate_schedule(*status, brackets)?;
        }

        Ok(Self { schedules })
    }

    /// Convenience constructor for jurisdictions with one schedule for all.
    pub fn single_schedule(brackets: Vec<TaxBracket>) -> Result<Self, TaxTableError> {
        Self::new(BTreeMap::from([(MaritalStatus::Single, brackets)]))
    }

    /// The schedule for `status`, or the single schedule when the table has
    /// none for that status.
    pub fn brackets(
        &self,
        status: MaritalStatus,
    ) -> &[TaxBracket] {
        self.schedules
            .get(&status)
            .or_else(|| self.schedules.get(&MaritalStatus::Single))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The bracket containing `income`, scanning in ascending order.
    pub fn find_bracket(
        &self,
        status: MaritalStatus,
        income: Decimal,
    ) -> Option<&TaxBracket> {
        self.brackets(status).iter().find(|b| b.contains(income))
    }

    /// Tax for `income` priced by its containing bracket, unrounded.
    /// `None` when no bracket contains the income (negative income).
    pub fn tax_for(
        &self,
        status: MaritalStatus,
        income: Decimal,
    ) -> Option<Decimal> {
        self.find_bracket(status, income).map(|b| b.calculate_tax(income))
    }

    pub fn has_schedule(
        &self,
        status: MaritalStatus,
    ) -> bool {
        self.schedules.contains_key(&status)
    }
}

fn validate_schedule(
    status: MaritalStatus,
    brackets: &[TaxBracket],
) -> Result<(), TaxTableError> {
    let first = brackets.first().ok_or(TaxTableError::Empty(status))?;
    if first.min_income != Decimal::ZERO {
        return Err(TaxTableError::DoesNotStartAtZero {
            status,
            min: first.min_income,
        });
    }

    for bracket in brackets {
        if bracket.rate < Decimal::ZERO {
            return Err(TaxTableError::NegativeRate {
                status,
                rate: bracket.rate,
            });
        }
    }

    for pair in brackets.windows(2) {
        let (lower, next) = (&pair[0], &pair[1]);
        let upper = lower.max_income.ok_or(TaxTableError::UnboundedBeforeEnd {
            status,
            min: lower.min_income,
        })?;
        if upper < next.min_income {
            return Err(TaxTableError::Gap {
                status,
                upper,
                next_min: next.min_income,
            });
        }
        if upper > next.min_income {
            return Err(TaxTableError::Overlap {
                status,
                upper,
                next_min: next.min_income,
            });
        }
    }

    match brackets.last() {
        Some(last) if last.is_top() => Ok(()),
        _ => Err(TaxTableError::MissingTopBracket(status)),
    }
}
