//! Error types for shared utilities.

use thiserror::Error;

/// Errors raised by DataFrame interop.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for CommonError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for shared utilities.
pub type Result<T> = std::result::Result<T, CommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let err: CommonError = polars_err.into();
        assert!(matches!(err, CommonError::DataFrame { .. }));
    }
}
