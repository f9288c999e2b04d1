//! Row-set data model for DataSnap.
//!
//! Both engines (type inference and batch processing) consume tables in the
//! shape defined here and never depend on each other directly.
//!
//! # Module Organization
//!
//! - [`value`]: Scalar cell values, records and tables
//! - [`types`]: Semantic and native type enumerations
//! - [`rules`]: Validation rules inferred from data and evaluated by batch jobs

use thiserror::Error;

pub mod rules;
pub mod types;
pub mod value;

pub use rules::{RuleKind, Severity, ValidationRule};
pub use types::{NativeType, SemanticType};
pub use value::{Record, Table, Value, format_numeric, table_columns};

/// Errors raised when building model values from untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Semantic type name is not part of the enumeration.
    #[error("unknown semantic type: {0}")]
    UnknownSemanticType(String),

    /// Severity name is not recognized.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}
