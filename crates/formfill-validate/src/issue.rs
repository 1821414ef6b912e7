//! Issues: derived descriptions of unmet constraints
//!
//! Issues are never persisted; the validation engine recomputes them each
//! turn from the current document.

use formfill_model::{FieldId, FormId, GroupId};
use serde::{Deserialize, Serialize};

/// Well-known issue codes emitted by the structural pass
pub mod codes {
    /// Required field is still unanswered
    pub const REQUIRED_MISSING: &str = "required_missing";
    /// Stored value no longer conforms to the field schema
    pub const NONCONFORMANT: &str = "nonconformant";
    /// Required field was explicitly skipped
    pub const SKIPPED_REQUIRED: &str = "skipped_required";
    /// Required field was aborted
    pub const ABORTED_REQUIRED: &str = "aborted_required";
    /// Field references a validator id missing from the registry
    pub const UNKNOWN_VALIDATOR: &str = "unknown_validator";
}

/// Issue severity; only `Error` on a required field blocks completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Must be resolved before the form can complete
    Error,
    /// Should be reviewed but never blocks
    Warning,
    /// Informational only
    Info,
}

impl Severity {
    /// Sort rank: errors first
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

/// What the issue refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "ref", rename_all = "snake_case")]
pub enum IssueScope {
    /// A single field
    Field(FieldId),
    /// A whole group
    Group(GroupId),
    /// The whole form
    Form(FormId),
}

impl IssueScope {
    /// Field id, if field-scoped
    #[inline]
    #[must_use]
    pub fn field_id(&self) -> Option<&FieldId> {
        match self {
            IssueScope::Field(id) => Some(id),
            _ => None,
        }
    }
}

/// Which pass produced the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    /// Built-in constraint checking
    Structural,
    /// Registered custom validator
    Custom,
}

/// One derived, non-persisted finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Severity
    pub severity: Severity,
    /// What the issue refers to
    #[serde(flatten)]
    pub scope: IssueScope,
    /// Human-readable message for the filler
    pub message: String,
    /// Machine-readable code
    pub code: Option<String>,
    /// Producing pass
    pub source: IssueSource,
}

impl Issue {
    /// Field-scoped error from the structural pass
    #[inline]
    #[must_use]
    pub fn field_error(id: FieldId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            scope: IssueScope::Field(id),
            message: message.into(),
            code: None,
            source: IssueSource::Structural,
        }
    }

    /// Field-scoped warning from the structural pass
    #[inline]
    #[must_use]
    pub fn field_warning(id: FieldId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            scope: IssueScope::Field(id),
            message: message.into(),
            code: None,
            source: IssueSource::Structural,
        }
    }

    /// Field-scoped info from the structural pass
    #[inline]
    #[must_use]
    pub fn field_info(id: FieldId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            scope: IssueScope::Field(id),
            message: message.into(),
            code: None,
            source: IssueSource::Structural,
        }
    }

    /// Group-scoped issue
    #[inline]
    #[must_use]
    pub fn group(severity: Severity, id: GroupId, message: impl Into<String>) -> Self {
        Self {
            severity,
            scope: IssueScope::Group(id),
            message: message.into(),
            code: None,
            source: IssueSource::Structural,
        }
    }

    /// Form-scoped issue
    #[inline]
    #[must_use]
    pub fn form(severity: Severity, id: FormId, message: impl Into<String>) -> Self {
        Self {
            severity,
            scope: IssueScope::Form(id),
            message: message.into(),
            code: None,
            source: IssueSource::Structural,
        }
    }

    /// With machine-readable code
    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Mark as produced by a custom validator
    #[inline]
    #[must_use]
    pub fn from_custom(mut self) -> Self {
        self.source = IssueSource::Custom;
        self
    }

    /// Whether this issue carries the given code
    #[inline]
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}
