use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One progressive-rate segment `[min_income, max_income)`.
///
/// `fixed_amount` is the tax already accumulated by all lower segments, so a
/// single bracket is enough to price any income it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    /// `None` marks the unbounded top bracket.
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        rate: Decimal,
        fixed_amount: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            rate,
            fixed_amount,
        }
    }

    /// Tax owed for `income` when priced by this bracket alone.
    ///
    /// Income at or below `min_income` yields zero. Income above
    /// `max_income` is clamped to the ceiling: the bracket never taxes
    /// beyond its own range.
    pub fn calculate_tax(
        &self,
        income: Decimal,
    ) -> Decimal {
        if income <= self.min_income {
            return Decimal::ZERO;
        }

        let effective = match self.max_income {
            Some(max_income) => income.min(max_income),
            None => income,
        };

        (effective - self.min_income) * self.rate + self.fixed_amount
    }

    /// Whether `income` falls into this bracket, inclusive at both ends.
    ///
    /// Both ends are inclusive so that a boundary income is priced by the
    /// lower bracket when brackets are scanned in order.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        self.min_income <= income && self.max_income.is_none_or(|max_income| income <= max_income)
    }

    pub fn is_top(&self) -> bool {
        self.max_income.is_none()
    }
}
