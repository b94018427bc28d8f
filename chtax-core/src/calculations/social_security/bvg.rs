use rust_decimal::Decimal;

use super::{Scheme, SocialSecurityContribution};
use crate::calculations::common::{percent_to_fraction, round_half_up};
use crate::models::BvgConfig;

/// Occupational pension (BVG).
///
/// Mandatory from the entry threshold and the first age band. The
/// coordination deduction scales with the work percentage; the coordinated
/// salary is then held between the statutory minimum and maximum. Employee
/// and employer each pay the age-band rate on it.
pub(super) fn occupational(
    config: &BvgConfig,
    salary: Decimal,
    age: u32,
    work_percentage: Decimal,
) -> SocialSecurityContribution {
    if salary < config.entry_threshold {
        return SocialSecurityContribution::not_applicable(
            Scheme::Bvg,
            format!("salary below the entry threshold of {}", config.entry_threshold),
        );
    }

    let rate = config.rate_for_age(age);
    if rate.is_zero() {
        return SocialSecurityContribution::not_applicable(Scheme::Bvg, format!("no contribution band for age {age}"));
    }

    let coordinated = coordinated_salary(config, salary, work_percentage);
    let share = round_half_up(coordinated * rate);

    SocialSecurityContribution {
        scheme: Scheme::Bvg,
        applicable: true,
        base: coordinated,
        employee: share,
        employer: share,
        is_tax_deductible: true,
        note: None,
    }
}

pub(super) fn coordinated_salary(
    config: &BvgConfig,
    salary: Decimal,
    work_percentage: Decimal,
) -> Decimal {
    let deduction = config.coordination_deduction * percent_to_fraction(work_percentage);
    let coordinated = salary - deduction;
    if coordinated <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    coordinated.clamp(config.min_coordinated_salary, config.max_coordinated_salary)
}
