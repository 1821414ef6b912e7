//! Document: a form plus its responses
//!
//! The document is the single shared mutable resource of the whole engine.
//! Serializing it is the checkpoint/resume mechanism; no other state
//! survives a fill session.

use crate::error::ModelError;
use crate::field::FieldId;
use crate::form::Form;
use crate::response::Response;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serialized document shape; responses are reconciled on the way in
#[derive(Serialize, Deserialize)]
struct DocumentData {
    form: Form,
    responses: IndexMap<FieldId, Response>,
}

/// A form and the current response per field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentData", into = "DocumentData")]
pub struct Document {
    form: Form,
    responses: IndexMap<FieldId, Response>,
}

impl Document {
    /// Create new document with every field unanswered
    #[must_use]
    pub fn new(form: Form) -> Self {
        let responses = form
            .fields()
            .map(|f| (f.id.clone(), Response::Unanswered))
            .collect();
        Self { form, responses }
    }

    /// The form schema
    #[inline]
    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Response for a field
    #[inline]
    #[must_use]
    pub fn response(&self, id: &FieldId) -> Option<&Response> {
        self.responses.get(id)
    }

    /// All responses in field declaration order
    #[inline]
    #[must_use]
    pub fn responses(&self) -> &IndexMap<FieldId, Response> {
        &self.responses
    }

    /// Replace a field's response, returning the prior one
    ///
    /// This is the patch engine's single write path; nothing else should
    /// mutate responses.
    pub fn replace_response(
        &mut self,
        id: &FieldId,
        response: Response,
    ) -> Result<Response, ModelError> {
        match self.responses.get_mut(id) {
            Some(slot) => Ok(std::mem::replace(slot, response)),
            None => Err(ModelError::UnknownField(id.clone())),
        }
    }

    /// Reset a field's response to unanswered, returning the prior one
    pub fn reset_response(&mut self, id: &FieldId) -> Result<Response, ModelError> {
        self.replace_response(id, Response::Unanswered)
    }

    /// Count of answered fields
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.responses.values().filter(|r| r.is_answered()).count()
    }
}

impl From<DocumentData> for Document {
    fn from(data: DocumentData) -> Self {
        // Reconcile: every schema field gets a response slot, responses for
        // fields no longer in the schema are dropped.
        let mut responses: IndexMap<FieldId, Response> = IndexMap::new();
        for field in data.form.fields() {
            let response = data
                .responses
                .get(&field.id)
                .cloned()
                .unwrap_or(Response::Unanswered);
            responses.insert(field.id.clone(), response);
        }
        Self {
            form: data.form,
            responses,
        }
    }
}

impl From<Document> for DocumentData {
    fn from(doc: Document) -> Self {
        DocumentData {
            form: doc.form,
            responses: doc.responses,
        }
    }
}
