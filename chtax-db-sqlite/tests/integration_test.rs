//! Calculation results stored through the SQLite backend.

use chtax_core::calculations::FilingAggregator;
use chtax_core::{CantonCode, Filing, IncomeSources, TaxProfile};
use chtax_db_sqlite::SqliteCalculationStore;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

async fn setup_test_store() -> SqliteCalculationStore {
    let store = SqliteCalculationStore::new(":memory:")
        .await
        .expect("Failed to create in-memory database");
    store.run_migrations().await.expect("Failed to run migrations");
    store
}

fn filing(id: i64, salary: rust_decimal::Decimal) -> Filing {
    let profile = TaxProfile {
        municipality: Some("Zürich".to_string()),
        income: IncomeSources {
            employment: salary,
            ..IncomeSources::default()
        },
        ..TaxProfile::default()
    };
    Filing::primary(id, 2024, CantonCode::from("ZH"), profile)
}

#[tokio::test]
async fn stored_result_is_returned_by_summary() {
    let store = setup_test_store().await;
    let service = chtax_data::builtin::service().unwrap();

    let stored = service.calculate_and_store(&store, &filing(1, dec!(100000))).await.unwrap();
    let summary = service.get_tax_summary(&store, 1).await.unwrap();

    assert_eq!(summary.as_ref(), Some(&stored));
    assert_eq!(stored.total_tax, dec!(14634.81));

    let history = store.history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total_tax.as_deref(), Some("14634.81"));
    assert_eq!(history[0].canton.as_deref(), Some("ZH"));
}

#[tokio::test]
async fn recalculation_appends_and_latest_wins() {
    let store = setup_test_store().await;
    let service = chtax_data::builtin::service().unwrap();

    service.calculate_and_store(&store, &filing(1, dec!(60000))).await.unwrap();
    let latest = service.calculate_and_store(&store, &filing(1, dec!(100000))).await.unwrap();

    assert_eq!(store.history(1).await.unwrap().len(), 2);
    assert_eq!(service.get_tax_summary(&store, 1).await.unwrap(), Some(latest));
}

#[tokio::test]
async fn aggregator_stores_every_successful_filing() {
    let store = setup_test_store().await;
    let service = chtax_data::builtin::service().unwrap();
    let aggregator = FilingAggregator::new(&service);
    let summary = aggregator.calculate_all_user_filings(&[filing(1, dec!(80000))]).unwrap();

    let stored = aggregator.store_all(&store, &summary).await.unwrap();

    assert_eq!(stored, 1);
    assert!(service.get_tax_summary(&store, 1).await.unwrap().is_some());
}
