//! Reference data compiled into the binary.

use chtax_core::{TaxCalculationService, TaxReference, TaxYearConfig};
use tracing::info;

use crate::loader::{ReferenceDataError, ReferenceSources};

const SOURCES_2024: ReferenceSources<'static> = ReferenceSources {
    config: include_str!("../data/2024/config.toml"),
    federal_brackets: include_str!("../data/2024/federal_brackets.csv"),
    canton_brackets: include_str!("../data/2024/canton_brackets.csv"),
    cantons: include_str!("../data/2024/cantons.csv"),
    municipal_multipliers: include_str!("../data/2024/municipal_multipliers.csv"),
    church_rates: include_str!("../data/2024/church_rates.csv"),
    wealth: include_str!("../data/2024/wealth.csv"),
};

/// Tax years with built-in reference data, ascending.
pub fn supported_years() -> Vec<i32> {
    vec![2024]
}

/// Embedded sources of `tax_year`.
pub fn sources(tax_year: i32) -> Result<ReferenceSources<'static>, ReferenceDataError> {
    match tax_year {
        2024 => Ok(SOURCES_2024),
        other => Err(ReferenceDataError::UnsupportedYear(other)),
    }
}

/// Built-in reference data of `tax_year`.
pub fn reference(tax_year: i32) -> Result<TaxReference, ReferenceDataError> {
    sources(tax_year)?.load()
}

/// Built-in configuration of `tax_year`, the starting point for overrides.
pub fn config(tax_year: i32) -> Result<TaxYearConfig, ReferenceDataError> {
    crate::loader::parse_config(sources(tax_year)?.config)
}

/// A service loaded with every built-in year.
pub fn service() -> Result<TaxCalculationService, ReferenceDataError> {
    let mut service = TaxCalculationService::new();
    for year in supported_years() {
        let reference = reference(year)?;
        info!(tax_year = year, cantons = reference.cantons.len(), "loaded built-in reference data");
        service.insert_reference(reference);
    }
    Ok(service)
}

#[cfg(test)]
mod tests {
    use chtax_core::{CantonCode, MaritalStatus};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn builtin_2024_loads() {
        let reference = reference(2024).expect("built-in data must load");

        assert_eq!(reference.tax_year(), 2024);
        assert_eq!(reference.cantons.len(), 26);
        assert_eq!(reference.wealth.len(), 26);
    }

    #[test]
    fn unknown_year_is_rejected() {
        assert!(matches!(reference(1999), Err(ReferenceDataError::UnsupportedYear(1999))));
    }

    #[test]
    fn config_matches_published_rates() {
        let config = config(2024).unwrap();

        assert_eq!(config.social_security.ahv.employee_rate, dec!(0.053));
        assert_eq!(config.social_security.alv.ceiling, dec!(148200));
        assert_eq!(config.deductions.pillar_3a_max, dec!(7056));
    }

    #[test]
    fn federal_table_has_both_schedules() {
        let reference = reference(2024).unwrap();

        assert_eq!(reference.federal.tax_for(MaritalStatus::Single, dec!(25000)), Some(dec!(72.00)));
        assert_eq!(reference.federal.tax_for(MaritalStatus::Married, dec!(40000)), Some(dec!(92.00)));
    }

    #[test]
    fn zurich_city_multiplier_is_known() {
        let reference = reference(2024).unwrap();

        assert_eq!(reference.municipal.get(2024, &CantonCode::from("ZH"), "Zürich"), Some(dec!(1.19)));
    }

    #[test]
    fn service_covers_every_builtin_year() {
        assert_eq!(service().unwrap().supported_years(), supported_years());
    }
}
