use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::factory::{StoreConfig, StoreFactory};
use super::store::{CalculationStore, StoreError};
use crate::models::FilingId;

/// Process-local store, the default backend.
#[derive(Debug, Default)]
pub struct InMemoryCalculationStore {
    snapshots: RwLock<HashMap<FilingId, Vec<Value>>>,
}

impl InMemoryCalculationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalculationStore for InMemoryCalculationStore {
    async fn insert(
        &self,
        filing_id: FilingId,
        breakdown: &Value,
    ) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .await
            .entry(filing_id)
            .or_default()
            .push(breakdown.clone());
        Ok(())
    }

    async fn get(
        &self,
        filing_id: FilingId,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&filing_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn count(
        &self,
        filing_id: FilingId,
    ) -> Result<usize, StoreError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&filing_id)
            .map_or(0, Vec::len))
    }
}

/// Factory for the `memory` backend. The connection string is ignored.
pub struct InMemoryStoreFactory;

#[async_trait]
impl StoreFactory for InMemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Box<dyn CalculationStore>, StoreError> {
        Ok(Box::new(InMemoryCalculationStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn get_returns_latest_snapshot() {
        let store = InMemoryCalculationStore::new();

        store.insert(1, &json!({ "total_tax": "100.00" })).await.unwrap();
        store.insert(1, &json!({ "total_tax": "120.00" })).await.unwrap();

        assert_eq!(store.get(1).await.unwrap(), Some(json!({ "total_tax": "120.00" })));
        assert_eq!(store.count(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn filings_are_independent() {
        let store = InMemoryCalculationStore::new();

        store.insert(1, &json!({ "a": 1 })).await.unwrap();

        assert_eq!(store.get(2).await.unwrap(), None);
        assert_eq!(store.count(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn factory_creates_empty_store() {
        let store = InMemoryStoreFactory.create(&StoreConfig::default()).await.unwrap();

        assert_eq!(store.get(1).await.unwrap(), None);
    }
}
