//! Patch wire model
//!
//! One [`Patch`] is one atomic mutation request against a single field.
//! Payloads arrive as loose JSON; the patch engine coerces them toward the
//! target field's kind before validating.

use crate::field::FieldId;
use serde::{Deserialize, Serialize};

/// One mutation request, keyed by `op` plus `fieldId` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Patch {
    /// Replace the field's value (scalar, list, selection, or full table)
    Set {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Candidate value, loose JSON
        value: serde_json::Value,
    },
    /// Append one item (list) or one row (table)
    Append {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Item or row, loose JSON
        value: serde_json::Value,
    },
    /// Delete list items / table rows by zero-based index
    DeleteByIndex {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Indices to remove; all must be in range
        indices: Vec<usize>,
    },
    /// Reset the field to unanswered
    Clear {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    /// Mark the field skipped
    Skip {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Non-empty reason
        reason: String,
    },
    /// Mark the field aborted
    Abort {
        /// Target field
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Non-empty reason
        reason: String,
    },
}

impl Patch {
    /// Set patch from any serializable value
    #[inline]
    #[must_use]
    pub fn set(field_id: impl Into<FieldId>, value: serde_json::Value) -> Self {
        Self::Set {
            field_id: field_id.into(),
            value,
        }
    }

    /// Append patch
    #[inline]
    #[must_use]
    pub fn append(field_id: impl Into<FieldId>, value: serde_json::Value) -> Self {
        Self::Append {
            field_id: field_id.into(),
            value,
        }
    }

    /// Delete-by-index patch
    #[inline]
    #[must_use]
    pub fn delete_by_index(field_id: impl Into<FieldId>, indices: Vec<usize>) -> Self {
        Self::DeleteByIndex {
            field_id: field_id.into(),
            indices,
        }
    }

    /// Clear patch
    #[inline]
    #[must_use]
    pub fn clear(field_id: impl Into<FieldId>) -> Self {
        Self::Clear {
            field_id: field_id.into(),
        }
    }

    /// Skip patch
    #[inline]
    #[must_use]
    pub fn skip(field_id: impl Into<FieldId>, reason: impl Into<String>) -> Self {
        Self::Skip {
            field_id: field_id.into(),
            reason: reason.into(),
        }
    }

    /// Abort patch
    #[inline]
    #[must_use]
    pub fn abort(field_id: impl Into<FieldId>, reason: impl Into<String>) -> Self {
        Self::Abort {
            field_id: field_id.into(),
            reason: reason.into(),
        }
    }

    /// Target field id
    #[must_use]
    pub fn field_id(&self) -> &FieldId {
        match self {
            Patch::Set { field_id, .. }
            | Patch::Append { field_id, .. }
            | Patch::DeleteByIndex { field_id, .. }
            | Patch::Clear { field_id }
            | Patch::Skip { field_id, .. }
            | Patch::Abort { field_id, .. } => field_id,
        }
    }

    /// Wire op name
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        match self {
            Patch::Set { .. } => "set",
            Patch::Append { .. } => "append",
            Patch::DeleteByIndex { .. } => "delete-by-index",
            Patch::Clear { .. } => "clear",
            Patch::Skip { .. } => "skip",
            Patch::Abort { .. } => "abort",
        }
    }
}
