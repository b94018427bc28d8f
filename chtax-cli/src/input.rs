//! Household input file: one answer map and the filings to compute.
//!
//! ```json
//! {
//!   "answers": { "marital_status": "single", "employment_income": "100'000" },
//!   "filings": [
//!     { "id": 1, "tax_year": 2024, "canton": "ZH", "is_primary": true },
//!     { "id": 2, "tax_year": 2024, "canton": "VS" }
//!   ]
//! }
//! ```

use std::path::Path;

use chtax_core::{Answers, CantonCode, Filing, FilingId, TaxProfile};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid household file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Household has no filings")]
    NoFilings,

    #[error("Filing id {0} is used more than once")]
    DuplicateFilingId(FilingId),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilingEntry {
    pub id: FilingId,
    pub tax_year: i32,
    pub canton: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Household {
    pub answers: Answers,
    pub filings: Vec<FilingEntry>,
}

impl Household {
    pub fn from_json(json: &str) -> Result<Self, HouseholdError> {
        let household: Household = serde_json::from_str(json)?;
        household.validate()?;
        Ok(household)
    }

    pub fn load(path: &Path) -> Result<Self, HouseholdError> {
        let json = std::fs::read_to_string(path).map_err(|source| HouseholdError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), HouseholdError> {
        if self.filings.is_empty() {
            return Err(HouseholdError::NoFilings);
        }
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.filings {
            if !seen.insert(entry.id) {
                return Err(HouseholdError::DuplicateFilingId(entry.id));
            }
        }
        Ok(())
    }

    /// One [`Filing`] per entry, all sharing the profile built from the
    /// answers.
    pub fn filings(&self) -> Vec<Filing> {
        let profile = TaxProfile::from_answers(&self.answers);
        self.filings
            .iter()
            .map(|entry| Filing {
                id: entry.id,
                tax_year: entry.tax_year,
                canton: CantonCode::new(entry.canton.as_str()),
                is_primary: entry.is_primary,
                profile: profile.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HOUSEHOLD: &str = r#"{
        "answers": {
            "marital_status": "married",
            "employment_income": "120'000",
            "properties": [{ "canton": "VS", "annual_rental_income": 18000 }]
        },
        "filings": [
            { "id": 1, "tax_year": 2024, "canton": "ZH", "is_primary": true },
            { "id": 2, "tax_year": 2024, "canton": "VS" }
        ]
    }"#;

    #[test]
    fn parses_answers_and_filings() {
        let household = Household::from_json(HOUSEHOLD).unwrap();

        let filings = household.filings();

        assert_eq!(filings.len(), 2);
        assert!(filings[0].is_primary);
        assert!(!filings[1].is_primary);
        assert_eq!(filings[1].canton, CantonCode::from("VS"));
        assert_eq!(filings[0].profile.income.employment, dec!(120000));
        assert_eq!(filings[0].profile, filings[1].profile);
    }

    #[test]
    fn empty_filings_are_rejected() {
        let json = r#"{ "answers": {}, "filings": [] }"#;

        assert!(matches!(Household::from_json(json), Err(HouseholdError::NoFilings)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "answers": {}, "filings": [
            { "id": 1, "tax_year": 2024, "canton": "ZH", "is_primary": true },
            { "id": 1, "tax_year": 2024, "canton": "VS" }
        ] }"#;

        assert!(matches!(Household::from_json(json), Err(HouseholdError::DuplicateFilingId(1))));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Household::load(Path::new("/nonexistent/household.json")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/household.json"));
    }
}
