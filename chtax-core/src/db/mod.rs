pub mod factory;
pub mod memory;
pub mod store;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use memory::{InMemoryCalculationStore, InMemoryStoreFactory};
pub use store::{CalculationStore, StoreError};
