//! DataSnap column type inference.
//!
//! Given a table sample, this crate computes per-column statistics, scores
//! every candidate semantic type, picks a winner with a confidence and an
//! ambiguity level, and groups the results in a reviewable session that a
//! user confirms before it is applied.
//!
//! # Example
//!
//! ```ignore
//! use datasnap_infer::{InferenceOptions, TypeInferenceEngine};
//!
//! let mut engine = TypeInferenceEngine::new();
//! let session = engine.analyze_data_types("sales-2024", &rows, &InferenceOptions::default());
//!
//! for inference in &session.inferences {
//!     println!("{} -> {} ({:.2})", inference.column, inference.suggested_type, inference.confidence);
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Deterministic**: sampling is evenly strided, ties resolve in type order
//! - **Never fails on data**: empty or malformed columns degrade to `unknown`
//! - **Independent scorers**: each candidate type is scored in isolation

mod conversion;
mod dates;
mod engine;
mod error;
mod inference;
mod options;
mod patterns;
mod reasoning;
mod rules;
mod sampling;
mod scoring;
mod session;
mod statistics;

// Engine and sessions
pub use engine::TypeInferenceEngine;
pub use session::{
    ConversionExample, ConversionPreview, InferenceMetadata, InferenceSession, SessionId,
    SessionStatus, TypeInference, TypeScore, UserConfirmation,
};

// Error type
pub use error::{InferenceError, Result};

// Options
pub use options::{CustomPattern, InferenceOptions};

// Column-level building blocks
pub use conversion::convert_value;
pub use inference::infer_column_type;
pub use sampling::{effective_sample_size, sample_rows};
pub use scoring::{ColumnSample, ScorerRegistry, TypeScorer, default_registry};
pub use statistics::{
    Distribution, NumericStats, StatisticalProperties, StringLengthStats, ValueFrequency,
    compute_statistics,
};
