use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::Computed;
use crate::calculations::common::round_half_up;
use crate::models::CantonCode;

/// Municipal tax multipliers (Steuerfuss) keyed by year, canton and
/// municipality name.
#[derive(Debug, Clone, Default)]
pub struct MunicipalMultipliers {
    exact: BTreeMap<(i32, CantonCode, String), Decimal>,
    folded: BTreeMap<(i32, CantonCode, String), Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalTax {
    pub municipality: Option<String>,
    pub multiplier: Decimal,
    pub amount: Decimal,
}

impl MunicipalMultipliers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        tax_year: i32,
        canton: CantonCode,
        municipality: &str,
        multiplier: Decimal,
    ) {
        let name = municipality.trim();
        self.folded
            .insert((tax_year, canton.clone(), fold(name)), multiplier);
        self.exact.insert((tax_year, canton, name.to_string()), multiplier);
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Exact match first, then a case-insensitive one.
    pub fn get(
        &self,
        tax_year: i32,
        canton: &CantonCode,
        municipality: &str,
    ) -> Option<Decimal> {
        let name = municipality.trim();
        self.exact
            .get(&(tax_year, canton.clone(), name.to_string()))
            .or_else(|| self.folded.get(&(tax_year, canton.clone(), fold(name))))
            .copied()
    }

    /// Multiplier for the municipality, or `default` with a warning when it
    /// is missing or unknown.
    pub fn multiplier(
        &self,
        tax_year: i32,
        canton: &CantonCode,
        municipality: Option<&str>,
        default: Decimal,
    ) -> Computed<Decimal> {
        let Some(name) = municipality else {
            warn!(%canton, tax_year, %default, "no municipality given; using default multiplier");
            return Computed::with_warning(
                default,
                format!("no municipality given for {canton}; municipal multiplier {default} used"),
            );
        };

        match self.get(tax_year, canton, name) {
            Some(multiplier) => Computed::ok(multiplier),
            None => {
                warn!(%canton, municipality = name, tax_year, %default, "unknown municipality; using default multiplier");
                Computed::with_warning(
                    default,
                    format!("unknown municipality {name} in {canton}; municipal multiplier {default} used"),
                )
            }
        }
    }

    /// Municipal tax: cantonal tax times the municipality's multiplier.
    pub fn calculate(
        &self,
        cantonal_tax: Decimal,
        tax_year: i32,
        canton: &CantonCode,
        municipality: Option<&str>,
        default: Decimal,
    ) -> Computed<MunicipalTax> {
        self.multiplier(tax_year, canton, municipality, default)
            .map(|multiplier| MunicipalTax {
                municipality: municipality.map(str::to_string),
                multiplier,
                amount: round_half_up(cantonal_tax * multiplier),
            })
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::test_support::init_test_tracing;

    fn multipliers() -> MunicipalMultipliers {
        let mut m = MunicipalMultipliers::new();
        m.insert(2024, CantonCode::from("ZH"), "Zürich", dec!(1.19));
        m.insert(2024, CantonCode::from("ZH"), "Winterthur", dec!(1.25));
        m
    }

    #[test]
    fn applies_exact_multiplier() {
        let tax = multipliers().calculate(dec!(5000), 2024, &CantonCode::from("ZH"), Some("Zürich"), dec!(1.0));

        assert_eq!(tax.value.amount, dec!(5950.00));
        assert_eq!(tax.value.multiplier, dec!(1.19));
        assert!(tax.warnings.is_empty());
    }

    #[test]
    fn matches_case_insensitively() {
        let m = multipliers();

        assert_eq!(m.get(2024, &CantonCode::from("ZH"), "ZÜRICH"), Some(dec!(1.19)));
        assert_eq!(m.get(2024, &CantonCode::from("ZH"), " winterthur "), Some(dec!(1.25)));
    }

    #[test]
    fn unknown_municipality_uses_default_with_warning() {
        let _guard = init_test_tracing();

        let tax = multipliers().calculate(dec!(5000), 2024, &CantonCode::from("ZH"), Some("Atlantis"), dec!(1.0));

        assert_eq!(tax.value.amount, dec!(5000.00));
        assert_eq!(tax.warnings.len(), 1);
        assert!(tax.warnings[0].contains("Atlantis"));
    }

    #[test]
    fn lookup_is_scoped_by_year_and_canton() {
        let m = multipliers();

        assert_eq!(m.get(2023, &CantonCode::from("ZH"), "Zürich"), None);
        assert_eq!(m.get(2024, &CantonCode::from("GE"), "Zürich"), None);
    }

    #[test]
    fn missing_municipality_uses_default() {
        let _guard = init_test_tracing();

        let tax = multipliers().calculate(dec!(5000), 2024, &CantonCode::from("ZH"), None, dec!(1.0));

        assert_eq!(tax.value.multiplier, dec!(1.0));
        assert_eq!(tax.warnings.len(), 1);
    }
}
