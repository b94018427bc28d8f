use std::path::Path;

use anyhow::{Context, Result};
use chtax_core::calculations::{FilingAggregator, MultiFilingSummary};
use chtax_core::db::{CalculationStore, StoreRegistry};
use chtax_core::{TaxCalculationService, TaxYearConfig};
use chtax_data::builtin;
use chtax_db_sqlite::SqliteStoreFactory;
use tracing::{debug, info};

use crate::input::Household;

/// Registry with every backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::with_memory();
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// The built-in reference data, with the year named in `config_path`
/// using that configuration instead of the embedded one.
pub fn build_service(config_path: Option<&Path>) -> Result<TaxCalculationService> {
    let mut service = builtin::service().context("Failed to load built-in reference data")?;

    if let Some(path) = config_path {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: TaxYearConfig = chtax_data::parse_config(&source)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        let tax_year = config.tax_year;

        let reference = builtin::sources(tax_year)
            .and_then(|sources| sources.load_with_config(config))
            .with_context(|| format!("No reference data for tax year {} of {}", tax_year, path.display()))?;
        service.insert_reference(reference);
        info!(tax_year, config = %path.display(), "configuration overridden");
    }

    Ok(service)
}

/// Computes every filing of the household and stores the successful ones.
pub async fn run(
    service: &TaxCalculationService,
    store: &dyn CalculationStore,
    household: &Household,
) -> Result<MultiFilingSummary> {
    let filings = household.filings();
    debug!(filings = filings.len(), "household loaded");

    let aggregator = FilingAggregator::new(service);
    let summary = aggregator
        .calculate_all_user_filings(&filings)
        .context("Failed to calculate filings")?;
    let stored = aggregator
        .store_all(store, &summary)
        .await
        .context("Failed to store results")?;

    info!(stored, grand_total = %summary.grand_total, "household calculated");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chtax_core::db::{InMemoryCalculationStore, StoreConfig};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn registry_knows_memory_and_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }

    #[tokio::test]
    async fn registry_creates_sqlite_store() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        assert!(build_registry().create(&config).await.is_ok());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = build_service(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();

        assert!(format!("{err:#}").contains("/nonexistent/config.toml"));
    }

    #[tokio::test]
    async fn run_stores_every_successful_filing() {
        let household = Household::from_json(
            r#"{
                "answers": { "municipality": "Zürich", "employment_income": 100000 },
                "filings": [{ "id": 11, "tax_year": 2024, "canton": "ZH", "is_primary": true }]
            }"#,
        )
        .unwrap();
        let service = build_service(None).unwrap();
        let store = InMemoryCalculationStore::new();

        let summary = run(&service, &store, &household).await.unwrap();

        assert_eq!(summary.grand_total, dec!(14634.81));
        assert_eq!(store.count(11).await.unwrap(), 1);
    }
}
