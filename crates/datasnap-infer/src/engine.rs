//! Session manager for type inference.

use std::collections::BTreeMap;
use std::time::Instant;

use datasnap_model::{Record, SemanticType, Table};
use tracing::{debug, info, info_span, warn};

use crate::conversion::convert_value;
use crate::error::{InferenceError, Result};
use crate::inference::{infer_column_type, infer_from_sample};
use crate::options::InferenceOptions;
use crate::sampling::{effective_sample_size, sample_rows};
use crate::session::{InferenceSession, SessionId, SessionStatus, TypeInference, UserConfirmation};

/// Runs analyses and keeps their sessions until they are applied.
///
/// Each engine owns its sessions; construct one per process (or per test).
#[derive(Debug, Default)]
pub struct TypeInferenceEngine {
    sessions: BTreeMap<SessionId, InferenceSession>,
}

impl TypeInferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze every column of `rows` and store the resulting session.
    ///
    /// Columns are taken from the first sampled row only; keys that appear
    /// only in later rows are not analyzed. An empty table produces an empty
    /// session that is already `confirmed`.
    pub fn analyze_data_types(
        &mut self,
        dataset_id: &str,
        rows: &[Record],
        options: &InferenceOptions,
    ) -> InferenceSession {
        let sample_size = effective_sample_size(options.sample_size, rows.len());
        let span = info_span!(
            "analyze_data_types",
            dataset_id = %dataset_id,
            rows = rows.len(),
            sample_size
        );
        let _guard = span.enter();
        let start = Instant::now();

        let mut session = InferenceSession::new(dataset_id);

        if rows.is_empty() {
            session.set_status(SessionStatus::Confirmed);
            debug!(session_id = %session.id, "Empty table, nothing to analyze");
            self.sessions.insert(session.id, session.clone());
            return session;
        }

        let sample = sample_rows(rows, sample_size);
        let columns: Vec<&String> = sample.first().map(|row| row.keys().collect()).unwrap_or_default();
        session.inferences = columns
            .into_iter()
            .map(|column| infer_from_sample(column, &sample, rows.len(), options))
            .collect();
        session.set_status(SessionStatus::PendingReview);

        info!(
            session_id = %session.id,
            columns = session.inferences.len(),
            needs_review = session.low_confidence_columns().len(),
            duration_ms = start.elapsed().as_millis(),
            "Type analysis complete"
        );

        self.sessions.insert(session.id, session.clone());
        session
    }

    /// Infer a single column without creating a session.
    pub fn infer_column_type(
        &self,
        column: &str,
        rows: &[Record],
        options: &InferenceOptions,
    ) -> TypeInference {
        infer_column_type(column, rows, options)
    }

    /// Replace the session's confirmations and mark it `confirmed`.
    ///
    /// # Errors
    ///
    /// [`InferenceError::SessionNotFound`] for an unknown id and
    /// [`InferenceError::InvalidState`] once the session is applied.
    pub fn confirm_types(
        &mut self,
        session_id: SessionId,
        confirmations: Vec<UserConfirmation>,
    ) -> Result<()> {
        let session = self.session_mut(session_id)?;
        match session.status {
            SessionStatus::PendingReview | SessionStatus::Confirmed => {
                session.confirmations = confirmations;
                session.set_status(SessionStatus::Confirmed);
                info!(
                    session_id = %session_id,
                    confirmations = session.confirmations.len(),
                    "Session confirmed"
                );
                Ok(())
            }
            status => Err(rejected(session_id, status, "confirm")),
        }
    }

    /// Move a confirmed session to `applied`.
    ///
    /// Applying an already applied session changes nothing.
    ///
    /// # Errors
    ///
    /// [`InferenceError::SessionNotFound`] for an unknown id and
    /// [`InferenceError::InvalidState`] unless the session is confirmed.
    pub fn apply_inferences(&mut self, session_id: SessionId) -> Result<()> {
        let session = self.session_mut(session_id)?;
        match session.status {
            SessionStatus::Confirmed => {
                session.set_status(SessionStatus::Applied);
                info!(session_id = %session_id, "Session applied");
                Ok(())
            }
            SessionStatus::Applied => Ok(()),
            status => Err(rejected(session_id, status, "apply")),
        }
    }

    pub fn get_session(&self, session_id: SessionId) -> Option<&InferenceSession> {
        self.sessions.get(&session_id)
    }

    /// All stored sessions, ordered by id.
    pub fn sessions(&self) -> impl Iterator<Item = &InferenceSession> {
        self.sessions.values()
    }

    /// Convert the values of `rows` to the applied session's column types.
    ///
    /// Uses the confirmed type where one exists, the suggestion otherwise.
    /// Missing and unconvertible values are kept as they are.
    ///
    /// # Errors
    ///
    /// [`InferenceError::SessionNotFound`] for an unknown id and
    /// [`InferenceError::InvalidState`] unless the session is applied.
    pub fn coerce_table(&self, session_id: SessionId, rows: &[Record]) -> Result<Table> {
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(InferenceError::SessionNotFound(session_id))?;
        if session.status != SessionStatus::Applied {
            return Err(rejected(session_id, session.status, "coerce with"));
        }

        let targets: Vec<(&str, SemanticType)> = session
            .inferences
            .iter()
            .filter_map(|i| {
                let target = session.effective_type(&i.column)?;
                (target != SemanticType::Unknown).then_some((i.column.as_str(), target))
            })
            .collect();

        Ok(rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                for (column, target) in &targets {
                    if let Some(value) = out.get_mut(*column)
                        && let Some(converted) = convert_value(value, *target)
                    {
                        *value = converted;
                    }
                }
                out
            })
            .collect())
    }

    fn session_mut(&mut self, session_id: SessionId) -> Result<&mut InferenceSession> {
        self.sessions
            .get_mut(&session_id)
            .ok_or(InferenceError::SessionNotFound(session_id))
    }
}

fn rejected(session_id: SessionId, status: SessionStatus, operation: &'static str) -> InferenceError {
    warn!(session_id = %session_id, status = %status, operation, "Rejected session transition");
    InferenceError::InvalidState {
        session_id,
        status,
        operation,
    }
}
