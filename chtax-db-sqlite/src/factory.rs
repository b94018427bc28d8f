use async_trait::async_trait;
use chtax_core::db::{CalculationStore, StoreConfig, StoreError, StoreFactory};

use crate::store::SqliteCalculationStore;

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`chtax_core::db::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use chtax_core::db::StoreRegistry;
/// use chtax_db_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::with_memory();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens the database named by `config.connection_string` and brings
    /// its schema up to date.
    ///
    /// Accepted values are a file path such as `"snapshots.db"`, a sqlx URL
    /// such as `"sqlite:snapshots.db"`, or `":memory:"`.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn CalculationStore>, StoreError> {
        let store = SqliteCalculationStore::new(&config.connection_string)
            .await
            .map_err(|e| StoreError::Connection(format!("{e:#}")))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;
        Ok(Box::new(store))
    }
}
