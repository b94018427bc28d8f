pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{CalculationError, TaxCalculationService, TaxReference};
pub use db::{CalculationStore, StoreError};
pub use models::*;
