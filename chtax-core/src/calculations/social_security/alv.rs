use rust_decimal::Decimal;

use super::{Scheme, SocialSecurityContribution};
use crate::calculations::common::{non_negative, round_half_up};
use crate::models::AlvConfig;

/// ALV: the base rate up to the ceiling plus a solidarity rate on the
/// excess. Both totals are shared evenly.
pub(super) fn employed(
    config: &AlvConfig,
    salary: Decimal,
) -> SocialSecurityContribution {
    let insured = salary.min(config.ceiling);
    let excess = non_negative(salary - config.ceiling);
    let total = insured * config.total_rate + excess * config.solidarity_total_rate;
    let share = round_half_up(total / Decimal::TWO);

    SocialSecurityContribution {
        scheme: Scheme::Alv,
        applicable: true,
        base: salary,
        employee: share,
        employer: share,
        is_tax_deductible: false,
        note: (excess > Decimal::ZERO).then(|| format!("solidarity contribution on {excess} above the ceiling")),
    }
}
