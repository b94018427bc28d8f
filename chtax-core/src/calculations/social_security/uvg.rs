use rust_decimal::Decimal;

use super::{Scheme, SocialSecurityContribution, SocialSecurityError};
use crate::calculations::common::round_half_up;
use crate::models::NbuConfig;

/// Non-occupational accident insurance, paid by the employee alone.
///
/// A supplied rate is validated even when the work percentage is too low
/// for the insurance to be mandatory.
pub(super) fn non_occupational(
    config: &NbuConfig,
    salary: Decimal,
    work_percentage: Decimal,
    nbu_rate: Option<Decimal>,
) -> Result<SocialSecurityContribution, SocialSecurityError> {
    let rate = nbu_rate.unwrap_or(config.default_rate);
    if rate < config.min_rate || rate > config.max_rate {
        return Err(SocialSecurityError::InvalidNbuRate {
            rate,
            min: config.min_rate,
            max: config.max_rate,
        });
    }

    if work_percentage < config.min_work_percentage {
        return Ok(SocialSecurityContribution::not_applicable(
            Scheme::UvgNbu,
            format!("not mandatory below {}% work percentage", config.min_work_percentage),
        ));
    }

    Ok(SocialSecurityContribution {
        scheme: Scheme::UvgNbu,
        applicable: true,
        base: salary,
        employee: round_half_up(salary * rate),
        employer: Decimal::ZERO,
        is_tax_deductible: false,
        note: None,
    })
}
