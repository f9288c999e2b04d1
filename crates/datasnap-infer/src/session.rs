//! Inference results and the reviewable session that groups them.

use std::fmt;

use chrono::{DateTime, Utc};
use datasnap_model::{NativeType, SemanticType, ValidationRule, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::statistics::StatisticalProperties;

/// Unique identifier of an inference session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session lifecycle: `analyzing -> pending_review -> confirmed -> applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Analyzing,
    PendingReview,
    Confirmed,
    Applied,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzing => "analyzing",
            Self::PendingReview => "pending_review",
            Self::Confirmed => "confirmed",
            Self::Applied => "applied",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of one candidate type, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeScore {
    pub semantic_type: SemanticType,
    pub score: f64,
}

/// One value before and after conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionExample {
    pub original: Value,
    /// `None` when the value did not convert.
    pub converted: Option<Value>,
}

impl ConversionExample {
    pub fn succeeded(&self) -> bool {
        self.converted.is_some()
    }
}

/// Outcome of converting every sampled value to the suggested type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPreview {
    pub total_values: usize,
    pub convertible: usize,
    pub unconvertible: usize,
    /// `convertible / total_values`, `0.0` without values.
    pub conversion_rate: f64,
    /// Set when at least one value did not convert.
    pub potential_data_loss: bool,
    pub examples: Vec<ConversionExample>,
}

impl ConversionPreview {
    pub fn empty() -> Self {
        Self {
            total_values: 0,
            convertible: 0,
            unconvertible: 0,
            conversion_rate: 0.0,
            potential_data_loss: false,
            examples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceMetadata {
    /// `1 - (best - runner_up)`; high means the top two types were close.
    pub ambiguity_level: f64,
    /// Confidence adjusted for missing values and cardinality.
    pub quality_score: f64,
    /// Every computed candidate score, in scorer order.
    pub scores: Vec<TypeScore>,
    /// Rows in the sample the column was inferred from.
    pub sample_size: usize,
    pub total_rows: usize,
    pub analyzed_at: DateTime<Utc>,
}

/// Inferred type of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInference {
    pub column: String,
    pub suggested_type: SemanticType,
    /// Runtime type of the raw values, independent of scoring.
    pub original_type: NativeType,
    pub confidence: f64,
    pub reasoning: String,
    pub conversion_preview: ConversionPreview,
    pub validation_rules: Vec<ValidationRule>,
    pub statistics: StatisticalProperties,
    pub metadata: InferenceMetadata,
    /// Confidence fell below the review threshold.
    pub needs_review: bool,
}

/// A user's decision about one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfirmation {
    pub column: String,
    pub confirmed_type: SemanticType,
    /// `true` when the suggestion was taken as is.
    pub accepted: bool,
    pub note: Option<String>,
}

impl UserConfirmation {
    /// Accept the suggested type.
    pub fn accept(inference: &TypeInference) -> Self {
        Self {
            column: inference.column.clone(),
            confirmed_type: inference.suggested_type,
            accepted: true,
            note: None,
        }
    }

    /// Replace the suggestion with another type.
    pub fn override_type(column: impl Into<String>, confirmed_type: SemanticType) -> Self {
        Self {
            column: column.into(),
            confirmed_type,
            accepted: false,
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The inferences of one analysis run plus the user's confirmations.
///
/// `inferences` is fixed once analysis completes; only the confirmations
/// and the status change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSession {
    pub id: SessionId,
    pub dataset_id: String,
    pub inferences: Vec<TypeInference>,
    pub confirmations: Vec<UserConfirmation>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InferenceSession {
    pub(crate) fn new(dataset_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            dataset_id: dataset_id.into(),
            inferences: Vec::new(),
            confirmations: Vec::new(),
            status: SessionStatus::Analyzing,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Inference for a column, if the column was analyzed.
    pub fn inference(&self, column: &str) -> Option<&TypeInference> {
        self.inferences.iter().find(|i| i.column == column)
    }

    /// Confirmation for a column, if the user acted on it.
    pub fn confirmation(&self, column: &str) -> Option<&UserConfirmation> {
        self.confirmations.iter().find(|c| c.column == column)
    }

    /// Columns flagged for review.
    pub fn low_confidence_columns(&self) -> Vec<&str> {
        self.inferences
            .iter()
            .filter(|i| i.needs_review)
            .map(|i| i.column.as_str())
            .collect()
    }

    /// Confirmed type of a column, falling back to the suggestion.
    pub fn effective_type(&self, column: &str) -> Option<SemanticType> {
        self.confirmation(column)
            .map(|c| c.confirmed_type)
            .or_else(|| self.inference(column).map(|i| i.suggested_type))
    }
}
