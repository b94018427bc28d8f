//! Library half of the `chtax` binary: household input, orchestration and
//! report rendering.

pub mod app;
pub mod input;
pub mod report;
