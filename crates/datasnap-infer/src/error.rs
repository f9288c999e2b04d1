//! Error types for type inference sessions.

use thiserror::Error;

use crate::session::{SessionId, SessionStatus};

/// Errors raised by session operations.
///
/// Analysis itself never fails: unusable column data is reported as an
/// `unknown` inference with zero confidence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// No session with this id is stored in the engine.
    #[error("inference session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session is not in a state that allows the operation.
    #[error("cannot {operation} session {session_id} while it is {status}")]
    InvalidState {
        session_id: SessionId,
        status: SessionStatus,
        operation: &'static str,
    },

    /// A custom pattern failed to compile.
    #[error("invalid custom pattern '{name}': {message}")]
    InvalidPattern { name: String, message: String },
}

/// Result type for inference session operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
