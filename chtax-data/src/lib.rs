//! Reference data for the Swiss tax engine: bracket tables, canton rules,
//! municipal multipliers, church and wealth rates and the per-year
//! configuration.
//!
//! Files are plain CSV and TOML. [`builtin`] embeds the published years;
//! [`ReferenceSources`] loads any other set of files the same way.

pub mod builtin;
pub mod loader;

pub use loader::{
    BracketLoader, BracketRecord, CantonLoader, CantonRecord, ChurchLoader, ChurchRecord, FEDERAL_JURISDICTION,
    MunicipalLoader, MunicipalRecord, ReferenceDataError, ReferenceSources, WealthLoader, WealthRecord, parse_config,
};
