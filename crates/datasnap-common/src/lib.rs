//! Shared utilities for DataSnap crates.
//!
//! This crate provides common helpers used across the DataSnap workspace:
//! Polars `DataFrame` interop, descriptive statistics and row fingerprints.

pub mod hash;
pub mod polars;
pub mod stats;

mod error;

pub use error::{CommonError, Result};

// Re-export commonly used functions at crate root for convenience
pub use datasnap_model::format_numeric;
pub use hash::row_fingerprint;
pub use polars::{any_to_string, any_to_value, dataframe_to_table};
