//! SQLite backend for calculation snapshots.

mod factory;
mod store;

pub use factory::SqliteStoreFactory;
pub use store::{SnapshotRecord, SqliteCalculationStore};
