use serde::{Deserialize, Serialize};

/// Two-letter canton code as it appears in answers and reference data
/// (`"ZH"`, `"GE"`, ...).
///
/// Codes are compared exactly. Whether a code is known is decided by the
/// canton registry of the tax year, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CantonCode(String);

impl CantonCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CantonCode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CantonCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}
