//! Fill record: append-only observability timeline
//!
//! The record captures turns, patch outcomes, and filler-supplied usage.
//! It is write-only from the scheduler's perspective and is never read back
//! as a decision input.

use crate::filler::Usage;
use crate::session::SessionStatus;
use chrono::{DateTime, Utc};
use formfill_model::GroupId;
use formfill_patch::{AppliedPatch, RejectedPatch};
use serde::{Deserialize, Serialize};

/// One completed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEntry {
    /// Absolute turn number
    pub turn_number: u32,
    /// Group scope, when the turn ran inside a sub-session
    pub group: Option<GroupId>,
    /// Issues surfaced to the filler this turn
    pub issues_presented: usize,
    /// Patches applied
    pub applied: Vec<AppliedPatch>,
    /// Patches rejected
    pub rejected: Vec<RejectedPatch>,
    /// Usage reported by the filler
    pub usage: Option<Usage>,
    /// When the turn finished
    pub at: DateTime<Utc>,
}

/// Append-only timeline of one fill session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    entries: Vec<TurnEntry>,
    started_at: Option<DateTime<Utc>>,
    finished: Option<(SessionStatus, DateTime<Utc>)>,
}

impl FillRecord {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark session start
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
    }

    /// Append one turn
    pub fn record_turn(&mut self, entry: TurnEntry) {
        self.entries.push(entry);
    }

    /// Mark terminal status
    pub fn finish(&mut self, status: SessionStatus) {
        self.finished = Some((status, Utc::now()));
    }

    /// Recorded turns, in completion order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    /// Number of recorded turns
    #[inline]
    #[must_use]
    pub fn turns_recorded(&self) -> usize {
        self.entries.len()
    }

    /// Terminal status, once finished
    #[must_use]
    pub fn terminal_status(&self) -> Option<&SessionStatus> {
        self.finished.as_ref().map(|(status, _)| status)
    }

    /// Total usage across all turns that reported it
    #[must_use]
    pub fn total_usage(&self) -> Usage {
        let mut total = Usage::default();
        for entry in &self.entries {
            if let Some(usage) = entry.usage {
                total.add(usage);
            }
        }
        total
    }

    /// Total applied / rejected patch counts
    #[must_use]
    pub fn patch_totals(&self) -> (usize, usize) {
        self.entries.iter().fold((0, 0), |(a, r), e| {
            (a + e.applied.len(), r + e.rejected.len())
        })
    }
}
