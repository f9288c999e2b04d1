//! Error types for batch jobs and the scheduler.

use thiserror::Error;

use crate::job::{BatchJobStatus, JobId};

/// Errors raised by the batch pipeline.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No job with this id is registered.
    #[error("batch job not found: {0}")]
    JobNotFound(JobId),

    /// The job's current status does not allow the operation.
    #[error("cannot {operation} job {job_id} while it is {status}")]
    InvalidTransition {
        job_id: JobId,
        status: BatchJobStatus,
        operation: &'static str,
    },

    /// The job was cancelled at a checkpoint.
    #[error("job cancelled")]
    Cancelled,

    /// The job exceeded its configured timeout.
    #[error("job timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A handler failed while processing rows.
    #[error("processing failed: {0}")]
    Processing(String),

    /// A hypothesis test could not be computed from the data.
    #[error("statistical test failed: {0}")]
    Statistics(String),

    /// Import or export text could not be read or written.
    #[error("{format} codec error: {message}")]
    Codec {
        format: &'static str,
        message: String,
    },

    /// Scheduler configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    /// Code recorded on a failed job.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TIMEOUT",
            _ => "PROCESSING_ERROR",
        }
    }
}

impl From<csv::Error> for BatchError {
    fn from(err: csv::Error) -> Self {
        Self::Codec {
            format: "csv",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec {
            format: "json",
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BatchError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BatchError::Timeout { seconds: 5 }.code(), "TIMEOUT");
        assert_eq!(BatchError::Processing("x".into()).code(), "PROCESSING_ERROR");
    }
}
