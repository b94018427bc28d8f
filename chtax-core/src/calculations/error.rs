use thiserror::Error;

use crate::calculations::social_security::SocialSecurityError;
use crate::db::StoreError;
use crate::models::{CantonCode, FilingId};

/// Failures that abort the calculation of a filing.
///
/// Recoverable problems (a failing canton calculator, a missing municipal
/// multiplier, wealth data gaps) never surface here; they are recorded as
/// warnings on the result.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("No calculator available for canton {0}")]
    UnknownCanton(CantonCode),

    #[error("tax year {0} is not supported")]
    UnsupportedTaxYear(i32),

    #[error("filing {filing_id}: secondary filing in {canton} has no property in that canton")]
    SecondaryWithoutProperty { filing_id: FilingId, canton: CantonCode },

    #[error("tax year {tax_year} has more than one primary filing: {filing_ids:?}")]
    MultiplePrimaryFilings { tax_year: i32, filing_ids: Vec<FilingId> },

    #[error("federal table has no bracket for income {0}")]
    NoFederalBracket(rust_decimal::Decimal),

    #[error("{0} exceeds the representable amount range")]
    AmountOverflow(&'static str),

    #[error(transparent)]
    SocialSecurity(#[from] SocialSecurityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("result of filing {filing_id} could not be encoded: {source}")]
    SnapshotEncoding {
        filing_id: FilingId,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored snapshot for filing {filing_id} is unreadable: {source}")]
    CorruptSnapshot {
        filing_id: FilingId,
        #[source]
        source: serde_json::Error,
    },
}
