//! Custom validator registry
//!
//! Validators are pure functions with a fixed signature, registered by id at
//! process startup. The registry is an explicit value handed to the
//! validation engine; there is no dynamic code loading and no global table.
//! Validators must be deterministic over their input — the engine relies on
//! this for reproducible sessions.

use crate::issue::{Issue, Severity};
use formfill_model::{Document, Field, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only input handed to a custom validator
#[derive(Debug)]
pub struct ValidatorInput<'a> {
    /// The whole document (validators may read across fields)
    pub document: &'a Document,
    /// The field that referenced the validator
    pub field: &'a Field,
    /// Field-scoped parameters from the validator reference
    pub params: &'a serde_json::Value,
}

/// A registered validator function
pub type ValidatorFn = Arc<dyn Fn(&ValidatorInput<'_>) -> Vec<Issue> + Send + Sync>;

/// Registry mapping validator ids to functions
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, ValidatorFn>,
}

impl ValidatorRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in validators
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("word_count", word_count);
        registry.register("answered_together", answered_together);
        registry
    }

    /// Register a validator under an id, replacing any prior registration
    pub fn register<F>(&mut self, id: impl Into<String>, validator: F)
    where
        F: Fn(&ValidatorInput<'_>) -> Vec<Issue> + Send + Sync + 'static,
    {
        self.validators.insert(id.into(), Arc::new(validator));
    }

    /// Look up a validator by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ValidatorFn> {
        self.validators.get(id)
    }

    /// Whether a validator id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.validators.contains_key(id)
    }

    /// Number of registered validators
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Registered validator ids
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("ValidatorRegistry")
            .field("validators", &names)
            .finish()
    }
}

/// Built-in: bound the word count of a text answer
///
/// Params: `{ "min": number?, "max": number? }`.
fn word_count(input: &ValidatorInput<'_>) -> Vec<Issue> {
    let Some(Value::Text(text)) = input
        .document
        .response(&input.field.id)
        .and_then(|r| r.value())
    else {
        return Vec::new();
    };

    let words = text.split_whitespace().count();
    let min = input.params.get("min").and_then(serde_json::Value::as_u64);
    let max = input.params.get("max").and_then(serde_json::Value::as_u64);

    let mut issues = Vec::new();
    if let Some(min) = min {
        if (words as u64) < min {
            issues.push(
                Issue::field_error(
                    input.field.id.clone(),
                    format!(
                        "field `{}` has {words} words, minimum is {min}",
                        input.field.id
                    ),
                )
                .with_code("word_count")
                .from_custom(),
            );
        }
    }
    if let Some(max) = max {
        if (words as u64) > max {
            issues.push(
                Issue::field_error(
                    input.field.id.clone(),
                    format!("field `{}` has {words} words, maximum is {max}", input.field.id),
                )
                .with_code("word_count")
                .from_custom(),
            );
        }
    }
    issues
}

/// Built-in: once this field is answered, the named peers must be answered too
///
/// Params: `{ "fields": ["peer_id", ...] }`. Cross-field, reads the whole
/// document.
fn answered_together(input: &ValidatorInput<'_>) -> Vec<Issue> {
    let answered = input
        .document
        .response(&input.field.id)
        .map(|r| r.is_answered())
        .unwrap_or(false);
    if !answered {
        return Vec::new();
    }

    let Some(peers) = input.params.get("fields").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for peer in peers.iter().filter_map(|v| v.as_str()) {
        let peer_id = formfill_model::FieldId::from(peer);
        let peer_answered = input
            .document
            .response(&peer_id)
            .map(|r| r.is_answered())
            .unwrap_or(false);
        if !peer_answered {
            issues.push(
                Issue {
                    severity: Severity::Warning,
                    scope: crate::issue::IssueScope::Field(peer_id),
                    message: format!(
                        "field `{peer}` should be answered once `{}` is",
                        input.field.id
                    ),
                    code: Some("answered_together".into()),
                    source: crate::issue::IssueSource::Custom,
                },
            );
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_model::{Field, FieldId, Form, Group, Response};
    use serde_json::json;

    fn doc_with_text(text: &str) -> Document {
        let mut doc = Document::new(Form::new(
            "f",
            vec![Group::new("g")
                .with_field(Field::text("bio"))
                .with_field(Field::text("refs"))],
        ));
        doc.replace_response(
            &FieldId::from("bio"),
            Response::answered(Value::Text(text.into())),
        )
        .unwrap();
        doc
    }

    #[test]
    fn registry_defaults() {
        let registry = ValidatorRegistry::with_defaults();
        assert!(registry.contains("word_count"));
        assert!(registry.contains("answered_together"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_register_custom() {
        let mut registry = ValidatorRegistry::new();
        registry.register("noop", |_input| Vec::new());
        assert!(registry.contains("noop"));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn word_count_bounds() {
        let doc = doc_with_text("one two three");
        let field = doc.form().field(&FieldId::from("bio")).unwrap();
        let params = json!({ "min": 5 });
        let input = ValidatorInput {
            document: &doc,
            field,
            params: &params,
        };
        let issues = word_count(&input);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].has_code("word_count"));
    }

    #[test]
    fn word_count_within_bounds_is_clean() {
        let doc = doc_with_text("one two three");
        let field = doc.form().field(&FieldId::from("bio")).unwrap();
        let params = json!({ "min": 1, "max": 5 });
        let input = ValidatorInput {
            document: &doc,
            field,
            params: &params,
        };
        assert!(word_count(&input).is_empty());
    }

    #[test]
    fn answered_together_flags_unanswered_peer() {
        let doc = doc_with_text("hello");
        let field = doc.form().field(&FieldId::from("bio")).unwrap();
        let params = json!({ "fields": ["refs"] });
        let input = ValidatorInput {
            document: &doc,
            field,
            params: &params,
        };
        let issues = answered_together(&input);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].scope.field_id().unwrap().as_str(), "refs");
    }
}
