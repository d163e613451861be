//! Export core modules shared across the CLI and desktop front ends.

#[cfg(feature = "excel")]
pub mod excel_core;
