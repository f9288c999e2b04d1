//! Batch jobs: identity, lifecycle, inputs and outputs.

use std::fmt;

use chrono::{DateTime, Utc};
use datasnap_model::{Table, ValidationRule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisReport;
use crate::cleaning::QualityReport;
use crate::codec::DataFormat;
use crate::config::BatchConfig;
use crate::hypothesis::HypothesisTest;
use crate::profiling::DatasetProfile;
use crate::progress::BatchProgress;
use crate::transform::TransformStep;
use crate::validation::ValidationReport;

/// Unique identifier of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of work a job performs. Each kind has exactly one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobType {
    Cleaning,
    Transformation,
    Validation,
    Export,
    Import,
    Analysis,
    Profiling,
}

impl BatchJobType {
    pub fn all() -> &'static [BatchJobType] {
        &[
            Self::Cleaning,
            Self::Transformation,
            Self::Validation,
            Self::Export,
            Self::Import,
            Self::Analysis,
            Self::Profiling,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cleaning => "cleaning",
            Self::Transformation => "transformation",
            Self::Validation => "validation",
            Self::Export => "export",
            Self::Import => "import",
            Self::Analysis => "analysis",
            Self::Profiling => "profiling",
        }
    }
}

impl fmt::Display for BatchJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle.
///
/// `queued -> running -> {completed | failed | cancelled}`, with
/// `running <-> paused` and `{queued, running, paused} -> cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl BatchJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// The job holds a concurrency slot in this state.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure recorded on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    /// `PROCESSING_ERROR` or `TIMEOUT`.
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub recoverable: bool,
    pub affected_rows: Vec<usize>,
}

/// What a job works on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub rows: Table,
    /// Steps of a transformation job.
    pub steps: Vec<TransformStep>,
    /// Rules of a validation job.
    pub rules: Vec<ValidationRule>,
    /// Format of `source_text` (import) or of the exported text (export).
    pub format: Option<DataFormat>,
    /// Raw text of an import job.
    pub source_text: Option<String>,
    pub description: Option<String>,
    /// Hypothesis tests run by an analysis job.
    #[serde(default)]
    pub tests: Vec<HypothesisTest>,
}

impl JobInput {
    pub fn from_rows(rows: Table) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Input of an import job.
    pub fn from_text(text: impl Into<String>, format: DataFormat) -> Self {
        Self {
            source_text: Some(text.into()),
            format: Some(format),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<TransformStep>) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_tests(mut self, tests: Vec<HypothesisTest>) -> Self {
        self.tests = tests;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What a finished job produced. Only the fields of its job type are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    pub rows: Option<Table>,
    pub quality_report: Option<QualityReport>,
    pub validation: Option<ValidationReport>,
    pub profile: Option<DatasetProfile>,
    pub analysis: Option<AnalysisReport>,
    pub exported: Option<String>,
}

/// Snapshot of one job.
///
/// Owned by the scheduler; callers only ever see clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: JobId,
    pub name: String,
    pub job_type: BatchJobType,
    pub status: BatchJobStatus,
    pub progress: BatchProgress,
    pub config: BatchConfig,
    pub input: JobInput,
    pub output: Option<JobOutput>,
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl BatchJob {
    pub(crate) fn new(
        name: impl Into<String>,
        job_type: BatchJobType,
        input: JobInput,
        config: BatchConfig,
    ) -> Self {
        let total_rows = input.rows.len();
        Self {
            id: JobId::new(),
            name: name.into(),
            job_type,
            status: BatchJobStatus::Queued,
            progress: BatchProgress::new(total_rows),
            config,
            input,
            output: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
        }
    }

    /// Record the end of the run in `status`.
    pub(crate) fn finish(&mut self, status: BatchJobStatus) {
        let now = Utc::now();
        self.status = status;
        self.completed_at = Some(now);
        self.duration_ms = self
            .started_at
            .map(|started| (now - started).num_milliseconds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(BatchJobStatus::Cancelled.is_terminal());
        assert!(!BatchJobStatus::Paused.is_terminal());
        assert!(BatchJobStatus::Paused.is_active());
        assert!(!BatchJobStatus::Queued.is_active());
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = BatchJob::new(
            "clean",
            BatchJobType::Cleaning,
            JobInput::default().with_description("nightly"),
            BatchConfig::default(),
        );
        assert_eq!(job.status, BatchJobStatus::Queued);
        assert!(job.started_at.is_none());
        assert_eq!(job.input.description.as_deref(), Some("nightly"));
    }

    #[test]
    fn test_job_type_labels() {
        assert_eq!(BatchJobType::all().len(), 7);
        assert_eq!(BatchJobType::Profiling.to_string(), "profiling");
        assert_eq!(
            serde_json::to_string(&BatchJobType::Import).unwrap(),
            "\"import\""
        );
    }
}
