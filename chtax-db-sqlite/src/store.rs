use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chtax_core::{CalculationStore, FilingId, StoreError};
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

/// One stored snapshot with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub id: i64,
    pub filing_id: FilingId,
    pub tax_year: Option<i32>,
    pub canton: Option<String>,
    pub is_primary: Option<bool>,
    pub total_tax: Option<String>,
    pub breakdown: Value,
    pub created_at: DateTime<Utc>,
}

pub struct SqliteCalculationStore {
    pool: SqlitePool,
}

impl SqliteCalculationStore {
    /// Opens `database_url`, creating the file when it does not exist.
    /// `:memory:` gives a private in-memory database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` sees the same database only through
        // a single pooled connection.
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every snapshot of a filing, oldest first.
    pub async fn history(
        &self,
        filing_id: FilingId,
    ) -> Result<Vec<SnapshotRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, filing_id, tax_year, canton, is_primary, total_tax, breakdown, created_at
             FROM calculation_snapshots WHERE filing_id = ? ORDER BY id",
        )
        .bind(filing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(row_to_snapshot).collect()
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn row_to_snapshot(row: &SqliteRow) -> Result<SnapshotRecord, StoreError> {
    let breakdown: String = row
        .try_get("breakdown")
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(SnapshotRecord {
        id: row.try_get("id").map_err(|e| StoreError::Database(e.to_string()))?,
        filing_id: row
            .try_get("filing_id")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        tax_year: row
            .try_get("tax_year")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        canton: row.try_get("canton").map_err(|e| StoreError::Database(e.to_string()))?,
        is_primary: row
            .try_get("is_primary")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        total_tax: row
            .try_get("total_tax")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        breakdown: parse_breakdown(&breakdown)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| StoreError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

fn parse_breakdown(raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Summary columns copied out of the breakdown so snapshots can be queried
/// without parsing JSON.
struct SummaryColumns {
    tax_year: Option<i64>,
    canton: Option<String>,
    is_primary: Option<bool>,
    total_tax: Option<String>,
}

impl SummaryColumns {
    fn extract(breakdown: &Value) -> Self {
        Self {
            tax_year: breakdown.get("tax_year").and_then(Value::as_i64),
            canton: breakdown.get("canton").and_then(Value::as_str).map(str::to_string),
            is_primary: breakdown.get("is_primary").and_then(Value::as_bool),
            total_tax: breakdown.get("total_tax").and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        }
    }
}

#[async_trait]
impl CalculationStore for SqliteCalculationStore {
    async fn insert(
        &self,
        filing_id: FilingId,
        breakdown: &Value,
    ) -> Result<(), StoreError> {
        let summary = SummaryColumns::extract(breakdown);
        let serialized = serde_json::to_string(breakdown).map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO calculation_snapshots (
                filing_id, tax_year, canton, is_primary, total_tax, breakdown, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(filing_id)
        .bind(summary.tax_year)
        .bind(summary.canton)
        .bind(summary.is_primary)
        .bind(summary.total_tax)
        .bind(serialized)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(filing_id, "snapshot stored");
        Ok(())
    }

    async fn get(
        &self,
        filing_id: FilingId,
    ) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(
            "SELECT breakdown FROM calculation_snapshots
             WHERE filing_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(filing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row
            .try_get("breakdown")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        parse_breakdown(&raw).map(Some)
    }

    async fn count(
        &self,
        filing_id: FilingId,
    ) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM calculation_snapshots WHERE filing_id = ?")
            .bind(filing_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        usize::try_from(count).map_err(|e| StoreError::Database(e.to_string()))
    }
}
