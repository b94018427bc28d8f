//! Tolerant access to the interview answer map.
//!
//! The interview collaborator hands over a JSON object keyed by question
//! identifier. Values arrive as whatever the form produced: numbers, numeric
//! strings with thousands separators, booleans, or free text. Nothing in
//! here fails: malformed amounts become zero and are logged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseAmountError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Normalizes input for decimal parsing: trims whitespace, drops a leading
/// currency tag and removes thousands separators (`,`, `'`, `’`, spaces).
fn normalize_amount_input(s: &str) -> String {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_prefix("CHF")
        .or_else(|| trimmed.strip_prefix("Fr."))
        .unwrap_or(trimmed);
    trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '\'' | '’' | ' ' | '\u{a0}'))
        .collect()
}

/// Parses a string into a [`Decimal`].
///
/// Empty or whitespace-only input is treated as 0.
pub fn parse_amount(s: &str) -> Result<Decimal, ParseAmountError> {
    let normalized = normalize_amount_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| ParseAmountError {
            input: s.to_string(),
            source: e,
        })
}

/// The raw answer map for one taxpayer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(Map<String, Value>);

impl Answers {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) {
        self.0.insert(key.into(), value);
    }

    /// A CHF amount; missing or malformed answers yield zero.
    pub fn amount(
        &self,
        key: &str,
    ) -> Decimal {
        self.get(key).map_or(Decimal::ZERO, |v| amount_from_value(key, v))
    }

    /// Like [`Answers::amount`] but distinguishes "not answered".
    pub fn optional_amount(
        &self,
        key: &str,
    ) -> Option<Decimal> {
        self.get(key).map(|v| amount_from_value(key, v))
    }

    /// A non-negative whole count; fractions are truncated.
    pub fn count(
        &self,
        key: &str,
    ) -> u32 {
        let amount = self.amount(key).trunc();
        if amount <= Decimal::ZERO {
            return 0;
        }
        u32::try_from(amount).unwrap_or_else(|_| {
            warn!(key, %amount, "count answer out of range; using 0");
            0
        })
    }

    pub fn optional_count(
        &self,
        key: &str,
    ) -> Option<u32> {
        self.get(key).map(|_| self.count(key))
    }

    /// A yes/no answer. Accepts booleans, numbers and common spellings.
    pub fn flag(
        &self,
        key: &str,
    ) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "1" | "ja" | "oui" | "si" | "sì"
            ),
            _ => false,
        }
    }

    /// A trimmed, non-empty text answer.
    pub fn text(
        &self,
        key: &str,
    ) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A list of nested answer objects; non-object entries are skipped.
    pub fn list(
        &self,
        key: &str,
    ) -> Vec<Answers> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(Answers(map.clone())),
                    other => {
                        warn!(key, value = %other, "ignoring non-object list entry");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for Answers {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn amount_from_value(
    key: &str,
    value: &Value,
) -> Decimal {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()).unwrap_or_else(|e| {
            warn!(key, error = %e, "unparseable numeric answer; using 0");
            Decimal::ZERO
        }),
        Value::String(s) => parse_amount(s).unwrap_or_else(|e| {
            warn!(key, error = %e, "malformed amount answer; using 0");
            Decimal::ZERO
        }),
        other => {
            warn!(key, value = %other, "non-numeric amount answer; using 0");
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn answers(value: Value) -> Answers {
        serde_json::from_value(value).unwrap()
    }

    // =========================================================================
    // parse_amount tests
    // =========================================================================

    #[test]
    fn parse_amount_strips_swiss_thousands_separator() {
        assert_eq!(parse_amount("100'000.50").unwrap(), dec!(100000.50));
    }

    #[test]
    fn parse_amount_strips_commas_and_currency() {
        assert_eq!(parse_amount("CHF 1,234.56").unwrap(), dec!(1234.56));
    }

    #[test]
    fn parse_amount_treats_blank_as_zero() {
        assert_eq!(parse_amount("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_accepts_scientific_notation() {
        assert_eq!(parse_amount("1e5").unwrap(), dec!(100000));
    }

    #[test]
    fn parse_amount_rejects_text() {
        assert!(parse_amount("about fifty").is_err());
    }

    // =========================================================================
    // Answers accessors
    // =========================================================================

    #[test]
    fn amount_reads_numbers_and_strings() {
        let a = answers(json!({ "x": 1200, "y": "3'400", "z": 0.016 }));

        assert_eq!(a.amount("x"), dec!(1200));
        assert_eq!(a.amount("y"), dec!(3400));
        assert_eq!(a.amount("z"), dec!(0.016));
    }

    #[test]
    fn amount_defaults_malformed_input_to_zero() {
        let a = answers(json!({ "x": "n/a", "y": true, "z": null }));

        assert_eq!(a.amount("x"), Decimal::ZERO);
        assert_eq!(a.amount("y"), Decimal::ZERO);
        assert_eq!(a.amount("z"), Decimal::ZERO);
        assert_eq!(a.amount("missing"), Decimal::ZERO);
    }

    #[test]
    fn optional_amount_distinguishes_missing() {
        let a = answers(json!({ "x": "" , "n": null }));

        assert_eq!(a.optional_amount("x"), Some(Decimal::ZERO));
        assert_eq!(a.optional_amount("n"), None);
        assert_eq!(a.optional_amount("missing"), None);
    }

    #[test]
    fn count_truncates_and_clamps() {
        let a = answers(json!({ "kids": "2.7", "neg": -3, "bad": "many" }));

        assert_eq!(a.count("kids"), 2);
        assert_eq!(a.count("neg"), 0);
        assert_eq!(a.count("bad"), 0);
    }

    #[test]
    fn flag_accepts_common_spellings() {
        let a = answers(json!({ "a": true, "b": "yes", "c": "Ja", "d": 1, "e": "no", "f": 0 }));

        assert!(a.flag("a"));
        assert!(a.flag("b"));
        assert!(a.flag("c"));
        assert!(a.flag("d"));
        assert!(!a.flag("e"));
        assert!(!a.flag("f"));
        assert!(!a.flag("missing"));
    }

    #[test]
    fn text_trims_and_skips_blank() {
        let a = answers(json!({ "m": "  Zürich ", "blank": "  " }));

        assert_eq!(a.text("m"), Some("Zürich".to_string()));
        assert_eq!(a.text("blank"), None);
    }

    #[test]
    fn list_keeps_only_objects() {
        let a = answers(json!({ "properties": [ { "canton": "GE" }, 3, "x" ] }));

        let items = a.list("properties");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("canton"), Some("GE".to_string()));
    }
}
