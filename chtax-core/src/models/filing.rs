use serde::{Deserialize, Serialize};

use crate::models::{CantonCode, TaxProfile};

pub type FilingId = i64;

/// One tax return: the primary return of the residence canton, or a
/// secondary return limited to property income in another canton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    pub id: FilingId,
    pub tax_year: i32,
    pub canton: CantonCode,
    pub is_primary: bool,
    pub profile: TaxProfile,
}

impl Filing {
    pub fn primary(
        id: FilingId,
        tax_year: i32,
        canton: CantonCode,
        profile: TaxProfile,
    ) -> Self {
        Self {
            id,
            tax_year,
            canton,
            is_primary: true,
            profile,
        }
    }

    pub fn secondary(
        id: FilingId,
        tax_year: i32,
        canton: CantonCode,
        profile: TaxProfile,
    ) -> Self {
        Self {
            id,
            tax_year,
            canton,
            is_primary: false,
            profile,
        }
    }
}
