use rust_decimal::Decimal;

use super::{Scheme, SocialSecurityContribution};
use crate::calculations::common::round_half_up;
use crate::models::{AhvConfig, SelfEmployedAhvConfig};

/// AHV/IV/EO on salary: a flat rate per party without ceiling.
pub(super) fn employed(
    config: &AhvConfig,
    salary: Decimal,
) -> SocialSecurityContribution {
    SocialSecurityContribution {
        scheme: Scheme::Ahv,
        applicable: true,
        base: salary,
        employee: round_half_up(salary * config.employee_rate),
        employer: round_half_up(salary * config.employer_rate),
        is_tax_deductible: false,
        note: None,
    }
}

/// AHV on self-employed income. Low incomes pay a reduced rate, the middle
/// band a flat amount, higher incomes the full rate.
pub(super) fn self_employed(
    config: &SelfEmployedAhvConfig,
    net_income: Decimal,
) -> SocialSecurityContribution {
    let contribution = if net_income <= config.low_income_limit {
        net_income * config.low_income_rate
    } else if net_income <= config.mid_income_limit {
        config.mid_income_contribution
    } else {
        net_income * config.high_income_rate
    };

    SocialSecurityContribution {
        scheme: Scheme::Ahv,
        applicable: true,
        base: net_income,
        employee: round_half_up(contribution),
        employer: Decimal::ZERO,
        is_tax_deductible: false,
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::test_support::test_year_config;

    #[test]
    fn employed_splits_evenly_without_ceiling() {
        let config = test_year_config().social_security.ahv;

        let c = employed(&config, dec!(500000));

        assert_eq!(c.employee, dec!(26500.00));
        assert_eq!(c.employer, dec!(26500.00));
        assert!(!c.is_tax_deductible);
    }

    #[test]
    fn self_employed_sliding_scale() {
        let config = test_year_config().social_security.self_employed;

        assert_eq!(self_employed(&config, dec!(9800)).employee, dec!(526.36));
        assert_eq!(self_employed(&config, dec!(9800.01)).employee, dec!(4000));
        assert_eq!(self_employed(&config, dec!(58800)).employee, dec!(4000));
        assert_eq!(self_employed(&config, dec!(100000)).employee, dec!(10000.00));
    }

    #[test]
    fn self_employed_zero_income_pays_nothing() {
        let config = test_year_config().social_security.self_employed;

        assert_eq!(self_employed(&config, dec!(0)).employee, dec!(0));
    }
}
