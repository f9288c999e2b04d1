//! Validation rules.
//!
//! Rules are inferred per column by the inference engine and evaluated row
//! by row by the batch validation job.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Rule severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Violations make the row invalid
    Error,
    /// Should review
    Warning,
    /// Informational only
    Info,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(ModelError::UnknownSeverity(s.to_string())),
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

/// What a rule checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Numeric value must lie within `[min, max]`.
    Range { min: f64, max: f64 },
    /// Text must match a regular expression.
    Format { pattern: String },
    /// Value must be one of the listed values.
    Enum { values: Vec<String> },
    /// Text length (in characters) must lie within `[min, max]`.
    Length { min: usize, max: usize },
    /// Value must not be missing.
    Required,
    /// Values must not repeat across rows.
    Uniqueness,
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Range { .. } => "range",
            RuleKind::Format { .. } => "format",
            RuleKind::Enum { .. } => "enum",
            RuleKind::Length { .. } => "length",
            RuleKind::Required => "required",
            RuleKind::Uniqueness => "uniqueness",
        }
    }
}

/// A rule bound to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub column: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub severity: Severity,
    pub message: String,
}

impl ValidationRule {
    pub fn new(
        column: impl Into<String>,
        kind: RuleKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            kind,
            severity,
            message: message.into(),
        }
    }
}
