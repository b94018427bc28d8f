use rust_decimal::Decimal;

use crate::calculations::CalculationError;
use crate::calculations::common::round_half_up;
use crate::models::{JurisdictionTaxTable, MaritalStatus};

/// Direct federal tax, priced on the federal bracket table.
#[derive(Debug, Clone, Copy)]
pub struct FederalTaxCalculator<'a> {
    table: &'a JurisdictionTaxTable,
}

impl<'a> FederalTaxCalculator<'a> {
    pub fn new(table: &'a JurisdictionTaxTable) -> Self {
        Self { table }
    }

    /// Federal tax on `taxable_income`, rounded to centimes.
    pub fn calculate(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
    ) -> Result<Decimal, CalculationError> {
        if taxable_income <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        self.table
            .tax_for(marital_status, taxable_income)
            .map(round_half_up)
            .ok_or(CalculationError::NoFederalBracket(taxable_income))
    }

    pub fn get_marginal_rate(
        &self,
        taxable_income: Decimal,
        marital_status: MaritalStatus,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.table
            .find_bracket(marital_status, taxable_income)
            .map_or(Decimal::ZERO, |b| b.rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::test_support::test_table;

    #[test]
    fn non_positive_income_is_untaxed() {
        let table = test_table();
        let calc = FederalTaxCalculator::new(&table);

        assert_eq!(calc.calculate(dec!(0), MaritalStatus::Single).unwrap(), dec!(0));
        assert_eq!(calc.calculate(dec!(-1), MaritalStatus::Married).unwrap(), dec!(0));
    }

    #[test]
    fn prices_single_and_married() {
        let table = test_table();
        let calc = FederalTaxCalculator::new(&table);

        assert_eq!(calc.calculate(dec!(25000.50), MaritalStatus::Single).unwrap(), dec!(750.03));
        assert_eq!(calc.calculate(dec!(25000), MaritalStatus::Married).unwrap(), dec!(200.00));
    }

    #[test]
    fn marginal_rate_follows_bracket() {
        let table = test_table();
        let calc = FederalTaxCalculator::new(&table);

        assert_eq!(calc.get_marginal_rate(dec!(50001), MaritalStatus::Single), dec!(0.10));
        assert_eq!(calc.get_marginal_rate(dec!(0), MaritalStatus::Single), dec!(0));
    }
}
