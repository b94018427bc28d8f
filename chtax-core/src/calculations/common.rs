//! Common utility functions for tax calculations.
//!
//! Shared rounding and clamping helpers used by every sub-calculator. All CHF
//! amounts leave a sub-calculator rounded to two fraction digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use chtax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_to(value, 2)
}

/// Rounds a rate (a fraction, not a percentage) to four decimal places.
///
/// ```
/// use rust_decimal_macros::dec;
/// use chtax_core::calculations::common::round_rate;
///
/// assert_eq!(round_rate(dec!(0.146348)), dec!(0.1463));
/// ```
pub fn round_rate(value: Decimal) -> Decimal {
    round_to(value, 4)
}

fn round_to(
    value: Decimal,
    dp: u32,
) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use chtax_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Clamps negative amounts to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Converts a whole-number percentage (e.g. `80` for 80%) to a fraction.
pub fn percent_to_fraction(percent: Decimal) -> Decimal {
    percent / Decimal::ONE_HUNDRED
}

/// Sums `amounts`, or `None` when the total leaves the range of [`Decimal`].
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use chtax_core::calculations::common::checked_sum;
///
/// assert_eq!(checked_sum([dec!(1.50), dec!(2.25)]), Some(dec!(3.75)));
/// assert_eq!(checked_sum([Decimal::MAX, dec!(1)]), None);
/// ```
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Divides `numerator` by `denominator`, returning zero when the denominator
/// is not positive.
pub fn ratio_or_zero(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(123.454));

        assert_eq!(result, dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(6556.305));

        assert_eq!(result, dec!(6556.31));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-123.455));

        assert_eq!(result, dec!(-123.46));
    }

    #[test]
    fn round_half_up_handles_small_values() {
        let result = round_half_up(dec!(0.001));

        assert_eq!(result, dec!(0.00));
    }

    #[test]
    fn round_half_up_handles_large_values() {
        let result = round_half_up(dec!(999999.999));

        assert_eq!(result, dec!(1000000.00));
    }

    // =========================================================================
    // round_rate tests
    // =========================================================================

    #[test]
    fn round_rate_keeps_four_places() {
        assert_eq!(round_rate(dec!(0.14634810)), dec!(0.1463));
        assert_eq!(round_rate(dec!(0.00005)), dec!(0.0001));
    }

    // =========================================================================
    // max / non_negative tests
    // =========================================================================

    #[test]
    fn max_returns_larger_value() {
        assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
        assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
    }

    #[test]
    fn max_handles_equal_values() {
        assert_eq!(max(dec!(150.00), dec!(150.00)), dec!(150.00));
    }

    #[test]
    fn non_negative_clamps_below_zero() {
        assert_eq!(non_negative(dec!(-0.01)), Decimal::ZERO);
        assert_eq!(non_negative(dec!(42.00)), dec!(42.00));
    }

    // =========================================================================
    // percent_to_fraction / ratio_or_zero tests
    // =========================================================================

    #[test]
    fn percent_to_fraction_divides_by_hundred() {
        assert_eq!(percent_to_fraction(dec!(80)), dec!(0.8));
    }

    #[test]
    fn ratio_or_zero_guards_non_positive_denominator() {
        assert_eq!(ratio_or_zero(dec!(10), dec!(0)), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(10), dec!(-5)), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(10), dec!(40)), dec!(0.25));
    }
}
