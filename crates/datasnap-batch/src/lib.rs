//! DataSnap batch processing.
//!
//! Long-running jobs over row sets (cleaning, transformation, validation,
//! profiling, analysis, import and export) run on a tokio runtime under a
//! [`BatchScheduler`] that bounds how many run at once. Running jobs report
//! throttled progress and can be paused, resumed or cancelled; pause and
//! cancel take effect at the next chunk boundary.
//!
//! The row-level pipelines are also usable on their own, without a
//! scheduler: see [`process_data_cleaning`] and [`process_data_transformation`].

mod analysis;
mod charts;
mod cleaning;
mod codec;
mod config;
mod control;
mod error;
mod handler;
mod hypothesis;
mod job;
mod profiling;
mod progress;
mod scheduler;
mod transform;
mod validation;

// Scheduler
pub use scheduler::BatchScheduler;

// Jobs and configuration
pub use config::{
    BatchConfig, BatchConfigOverrides, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENT_JOBS,
    SchedulerConfig,
};
pub use job::{BatchJob, BatchJobStatus, BatchJobType, JobError, JobId, JobInput, JobOutput};
pub use progress::{BatchProgress, ProgressTracker};

// Error type
pub use error::{BatchError, Result};

// Pipelines
pub use analysis::{
    AnalysisReport, CORRELATION_THRESHOLD, DatasetSummary, Insight, InsightKind, InsightPriority,
    analyze_profile, analyze_table,
};
pub use charts::{ChartSuggestion, ChartType, suggest_charts};
pub use cleaning::{
    CleaningResult, DataCleaner, IssueCategory, PROGRESS_EVERY_ROWS, QualityIssue, QualityReport,
    process_data_cleaning,
};
pub use codec::{DataFormat, export_rows, import_rows};
pub use hypothesis::{
    DEFAULT_ALPHA, Group, HypothesisTest, TestResult, independent_t_test, interpret,
    one_sample_t_test, one_way_anova, paired_t_test, run_test,
};
pub use profiling::{
    ANOMALY_IQR_THRESHOLD, Anomaly, CategoryCount, ColumnKind, ColumnProfile, DatasetProfile,
    NumericProfile, TOP_CATEGORIES, profile_column, profile_table,
};
pub use transform::{
    AggregateFunction, Aggregation, FilterOperator, SortDirection, StepKind, TransformStep,
    apply_step, process_data_transformation,
};
pub use validation::{RuleSummary, ValidationIssue, ValidationReport, Validator, validate_rows};
