//! Patch application
//!
//! Applies a batch of patches against a document. Each patch is independent
//! and atomic: the candidate value is built and validated in full before the
//! response store is touched, and a rejection leaves the prior response
//! byte-identical. One patch's rejection never blocks its siblings.

use crate::coerce::{coerce_item, coerce_value, AppendItem};
use crate::error::PatchError;
use formfill_model::{conformance, Document, Field, FieldId, FieldKind, Patch, Response, Value};
use serde::{Deserialize, Serialize};

/// Record of one successfully applied patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPatch {
    /// Target field
    pub field_id: FieldId,
    /// Wire op name
    pub op: String,
    /// Non-fatal coercion warnings recorded while interpreting the payload
    pub coercion_warnings: Vec<String>,
}

/// Record of one rejected patch, with the reason handed back to the filler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPatch {
    /// Target field
    pub field_id: FieldId,
    /// Wire op name
    pub op: String,
    /// Human-readable rejection reason
    pub reason: String,
}

/// Outcome of one batch apply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Patches applied, in submission order
    pub applied: Vec<AppliedPatch>,
    /// Patches rejected, in submission order
    pub rejected: Vec<RejectedPatch>,
}

impl ApplyOutcome {
    /// Number of applied patches
    #[inline]
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of rejected patches
    #[inline]
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Whether every patch applied
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Merge another outcome into this one, preserving order
    pub fn merge(&mut self, other: ApplyOutcome) {
        self.applied.extend(other.applied);
        self.rejected.extend(other.rejected);
    }
}

/// Apply a batch of patches, best-effort
pub fn apply(document: &mut Document, patches: &[Patch]) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for patch in patches {
        match apply_one(document, patch) {
            Ok(warnings) => outcome.applied.push(AppliedPatch {
                field_id: patch.field_id().clone(),
                op: patch.op_name().to_string(),
                coercion_warnings: warnings,
            }),
            Err(e) => outcome.rejected.push(RejectedPatch {
                field_id: patch.field_id().clone(),
                op: patch.op_name().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    outcome
}

/// Apply a single patch atomically
///
/// The document is mutated only on the `Ok` path, and only through one
/// `replace_response` call.
pub fn apply_one(document: &mut Document, patch: &Patch) -> Result<Vec<String>, PatchError> {
    let field = document
        .form()
        .field(patch.field_id())
        .cloned()
        .ok_or_else(|| PatchError::UnknownField(patch.field_id().clone()))?;

    match patch {
        Patch::Set { value, .. } => {
            let (candidate, warnings) = coerce_value(&field, value)?;
            validate(&field, &candidate)?;
            store(document, &field.id, Response::answered(candidate));
            Ok(warnings)
        }
        Patch::Append { value, .. } => {
            let (item, warnings) = coerce_item(&field, value)?;
            let candidate = appended(document, &field, item);
            validate(&field, &candidate)?;
            store(document, &field.id, Response::answered(candidate));
            Ok(warnings)
        }
        Patch::DeleteByIndex { indices, .. } => {
            let candidate = deleted(document, &field, indices)?;
            validate(&field, &candidate)?;
            store(document, &field.id, Response::answered(candidate));
            Ok(Vec::new())
        }
        Patch::Clear { .. } => {
            store(document, &field.id, Response::Unanswered);
            Ok(Vec::new())
        }
        Patch::Skip { reason, .. } => {
            require_reason(reason, "skip")?;
            store(
                document,
                &field.id,
                Response::Skipped {
                    reason: reason.clone(),
                },
            );
            Ok(Vec::new())
        }
        Patch::Abort { reason, .. } => {
            require_reason(reason, "abort")?;
            store(
                document,
                &field.id,
                Response::Aborted {
                    reason: reason.clone(),
                },
            );
            Ok(Vec::new())
        }
    }
}

fn validate(field: &Field, candidate: &Value) -> Result<(), PatchError> {
    let verdict = conformance::check(field, candidate);
    if verdict.is_ok() {
        Ok(())
    } else {
        Err(PatchError::Nonconformant {
            reasons: verdict.reasons().join("; "),
        })
    }
}

fn store(document: &mut Document, id: &FieldId, response: Response) {
    // Field existence was checked up front; the store cannot miss here.
    let _ = document.replace_response(id, response);
}

/// Current list/table value with the new item appended
fn appended(document: &Document, field: &Field, item: AppendItem) -> Value {
    let current = document.response(&field.id).and_then(|r| r.value());
    match item {
        AppendItem::Entry(entry) => {
            let mut items = match current {
                Some(Value::TextList(items)) | Some(Value::UrlList(items)) => items.clone(),
                _ => Vec::new(),
            };
            items.push(entry);
            match field.kind {
                FieldKind::UrlList => Value::UrlList(items),
                _ => Value::TextList(items),
            }
        }
        AppendItem::Row(row) => {
            let mut rows = match current {
                Some(Value::Table(rows)) => rows.clone(),
                _ => Vec::new(),
            };
            rows.push(row);
            Value::Table(rows)
        }
    }
}

/// Current list/table value with the indexed items removed
///
/// Every index must be in range before anything is removed; duplicates are
/// deduped and removal runs descending so indices stay stable.
fn deleted(document: &Document, field: &Field, indices: &[usize]) -> Result<Value, PatchError> {
    if !field.kind.is_list_like() {
        return Err(PatchError::UnsupportedOp {
            field: field.id.clone(),
            kind: field.kind.name(),
            op: "delete-by-index",
        });
    }

    let current = document.response(&field.id).and_then(|r| r.value());
    let len = current.and_then(Value::list_len).unwrap_or(0);

    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if let Some(&index) = sorted.iter().find(|&&i| i >= len) {
        return Err(PatchError::IndexOutOfRange { index, len });
    }

    match current {
        Some(Value::TextList(items)) => {
            let mut items = items.clone();
            for &i in sorted.iter().rev() {
                items.remove(i);
            }
            Ok(Value::TextList(items))
        }
        Some(Value::UrlList(items)) => {
            let mut items = items.clone();
            for &i in sorted.iter().rev() {
                items.remove(i);
            }
            Ok(Value::UrlList(items))
        }
        Some(Value::Table(rows)) => {
            let mut rows = rows.clone();
            for &i in sorted.iter().rev() {
                rows.remove(i);
            }
            Ok(Value::Table(rows))
        }
        // Unanswered list: only an empty index set is in range, and the
        // result is an empty list of the field's shape.
        _ => Ok(match field.kind {
            FieldKind::UrlList => Value::UrlList(Vec::new()),
            FieldKind::Table { .. } => Value::Table(Vec::new()),
            _ => Value::TextList(Vec::new()),
        }),
    }
}

fn require_reason(reason: &str, op: &'static str) -> Result<(), PatchError> {
    if reason.trim().is_empty() {
        Err(PatchError::EmptyReason { op })
    } else {
        Ok(())
    }
}
