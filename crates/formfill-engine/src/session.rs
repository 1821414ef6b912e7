//! Session identity, terminal status, and the caller-facing report

use crate::error::EngineError;
use crate::record::FillRecord;
use formfill_model::{Document, GroupId};
use formfill_validate::Issue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Unique fill-session identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal session status
///
/// Budget exhaustion (`MaxTurnsReached`, `BatchLimitReached`) is an expected
/// outcome, distinct from `Error`; the caller can resume by re-submitting
/// the serialized document with a bumped starting turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No blocking issues remain in scope
    Complete,
    /// The total turn budget ran out
    #[serde(rename = "max_turns")]
    MaxTurnsReached,
    /// The per-call turn budget ran out; resumable
    #[serde(rename = "batch_limit")]
    BatchLimitReached,
    /// Cancellation was signalled
    Cancelled,
    /// Filler exhaustion or an internal invariant violation
    Error {
        /// Top-level message
        message: String,
        /// Underlying cause chain, outermost first
        cause: Vec<String>,
    },
}

impl SessionStatus {
    /// Whether the session ended in true failure
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, SessionStatus::Error { .. })
    }

    /// Whether the caller may resume with a fresh session
    #[inline]
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            SessionStatus::MaxTurnsReached | SessionStatus::BatchLimitReached
        )
    }

    /// Build the error status from an engine error, preserving causes
    #[must_use]
    pub fn from_engine_error(error: &EngineError) -> Self {
        let mut chain = error.cause_chain();
        let message = chain.remove(0);
        SessionStatus::Error {
            message,
            cause: chain,
        }
    }
}

/// What one `run` call hands back to the caller
///
/// Carries everything needed to resume or diagnose without replaying the
/// session: the final document snapshot, the last issue list, per-group
/// outcomes, and the fill record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier
    pub session_id: SessionId,
    /// Terminal status
    pub status: SessionStatus,
    /// Turns consumed by this call
    pub turns_used: u32,
    /// Starting turn number for a resumed follow-up call
    pub next_turn_number: u32,
    /// Issues outstanding at termination, in priority order
    pub last_issues: Vec<Issue>,
    /// Terminal state each group sub-session reached
    pub group_outcomes: HashMap<GroupId, SessionStatus>,
    /// Observability timeline
    pub record: FillRecord,
    /// Final document snapshot; serialize it to checkpoint
    pub document: Document,
}

impl SessionReport {
    /// Whether the form is fully complete
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }
}
