//! The filler abstraction
//!
//! A [`Filler`] is the external actor — an interactive human prompt or an
//! LLM tool-call loop — that proposes patches in response to issues. The
//! scheduler is agnostic to which; `propose` is its only suspension point.

use crate::error::FillerError;
use crate::session::SessionId;
use async_trait::async_trait;
use formfill_model::{
    ChoiceOption, Constraints, Document, Field, FieldId, FieldKind, GroupId, Patch, Response,
};
use formfill_validate::Issue;
use serde::{Deserialize, Serialize};

/// Read-only schema view of one field, handed to the filler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field identifier
    pub id: FieldId,
    /// Human-readable label
    pub label: String,
    /// Field kind
    pub kind: FieldKind,
    /// Constraint set
    pub constraints: Constraints,
    /// Options for choice / checkbox-set kinds
    pub options: Vec<ChoiceOption>,
    /// Current response snapshot
    pub response: Response,
}

impl FieldSchema {
    /// Build the view from a field and its current response
    #[must_use]
    pub fn from_field(field: &Field, response: &Response) -> Self {
        Self {
            id: field.id.clone(),
            label: field.label.clone(),
            kind: field.kind.clone(),
            constraints: field.constraints.clone(),
            options: field.options.clone(),
            response: response.clone(),
        }
    }

    /// Views for the given fields of a document snapshot
    #[must_use]
    pub fn for_fields(document: &Document, fields: &[FieldId]) -> Vec<Self> {
        fields
            .iter()
            .filter_map(|id| {
                let field = document.form().field(id)?;
                let response = document.response(id)?;
                Some(Self::from_field(field, response))
            })
            .collect()
    }
}

/// What the scheduler hands to the filler each turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Owning session
    pub session_id: SessionId,
    /// Absolute turn number
    pub turn_number: u32,
    /// Group scope, when this turn belongs to a sub-session
    pub group_id: Option<GroupId>,
    /// Prioritized issues, capped at `max_issues_per_turn`
    pub issues: Vec<Issue>,
    /// Schema views for every field in scope
    pub fields: Vec<FieldSchema>,
}

/// Token and tool-call accounting supplied by the filler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens consumed
    pub input_tokens: u64,
    /// Completion tokens produced
    pub output_tokens: u64,
    /// Tool calls made
    pub tool_calls: u32,
}

impl Usage {
    /// Accumulate another usage sample
    pub fn add(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.tool_calls += other.tool_calls;
    }
}

/// The filler's answer to one turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchProposal {
    /// Proposed patch batch
    pub patches: Vec<Patch>,
    /// Optional usage accounting for the fill record
    pub usage: Option<Usage>,
}

impl PatchProposal {
    /// Proposal with patches and no usage data
    #[inline]
    #[must_use]
    pub fn of(patches: Vec<Patch>) -> Self {
        Self {
            patches,
            usage: None,
        }
    }

    /// With usage accounting
    #[inline]
    #[must_use]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// External actor proposing patches in response to issues
#[async_trait]
pub trait Filler: Send + Sync {
    /// Propose a patch batch for the presented issues
    ///
    /// Expected to carry its own timeout/retry policy for whatever backend
    /// it talks to; the scheduler only retries on
    /// [`FillerError::is_retryable`] failures.
    async fn propose(&self, turn: TurnRequest) -> Result<PatchProposal, FillerError>;
}
