use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::FilingId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

/// Persistence boundary for calculation snapshots.
///
/// Snapshots are immutable: `insert` always appends, and `get` returns the
/// most recent snapshot of a filing.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    async fn insert(
        &self,
        filing_id: FilingId,
        breakdown: &Value,
    ) -> Result<(), StoreError>;

    async fn get(
        &self,
        filing_id: FilingId,
    ) -> Result<Option<Value>, StoreError>;

    /// Number of snapshots kept for a filing.
    async fn count(
        &self,
        filing_id: FilingId,
    ) -> Result<usize, StoreError>;
}
