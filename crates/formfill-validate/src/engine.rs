//! Validation engine
//!
//! Combines the structural pass with registered custom validators and orders
//! the result deterministically: required-missing first, then group phase
//! order ascending, then field declaration order, then severity. The
//! scheduler truncates this ordering when issue counts are capped.

use crate::filter::FieldFilter;
use crate::issue::{codes, Issue, IssueScope, Severity};
use crate::registry::{ValidatorInput, ValidatorRegistry};
use crate::structural::structural_issues;
use formfill_model::{Document, FieldId};
use std::collections::HashMap;

/// Compute all issues for the document
#[must_use]
pub fn compute_issues(document: &Document, registry: &ValidatorRegistry) -> Vec<Issue> {
    compute_issues_scoped(document, registry, &FieldFilter::all())
}

/// Compute issues for the admitted fields only
#[must_use]
pub fn compute_issues_scoped(
    document: &Document,
    registry: &ValidatorRegistry,
    filter: &FieldFilter,
) -> Vec<Issue> {
    let mut issues = structural_issues(document, filter);
    issues.extend(custom_issues(document, registry, filter));
    sort_issues(document, &mut issues);
    issues
}

/// Run every referenced custom validator over the admitted fields
fn custom_issues(
    document: &Document,
    registry: &ValidatorRegistry,
    filter: &FieldFilter,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for field in document.form().fields() {
        if !filter.admits(field) {
            continue;
        }
        for validator_ref in &field.validators {
            match registry.get(&validator_ref.id) {
                Some(validator) => {
                    let input = ValidatorInput {
                        document,
                        field,
                        params: &validator_ref.params,
                    };
                    issues.extend(validator(&input));
                }
                None => {
                    issues.push(
                        Issue::field_info(
                            field.id.clone(),
                            format!(
                                "field `{}` references unregistered validator `{}`",
                                field.id, validator_ref.id
                            ),
                        )
                        .with_code(codes::UNKNOWN_VALIDATOR),
                    );
                }
            }
        }
    }

    issues
}

/// Deterministic issue ordering
///
/// Key: required-missing first, then group `order` ascending, then field
/// declaration order, then severity rank, then message. Group-scoped issues
/// sort after their group's fields; form-scoped issues sort last.
pub fn sort_issues(document: &Document, issues: &mut [Issue]) {
    let positions = field_positions(document);

    issues.sort_by(|a, b| {
        issue_key(document, &positions, a).cmp(&issue_key(document, &positions, b))
    });
}

type SortKey = (u8, u32, usize, u8, String);

fn field_positions(document: &Document) -> HashMap<FieldId, (u32, usize)> {
    let mut positions = HashMap::new();
    let mut decl = 0usize;
    for group in document.form().groups() {
        for field in &group.fields {
            positions.entry(field.id.clone()).or_insert((group.order, decl));
            decl += 1;
        }
    }
    positions
}

fn issue_key(
    document: &Document,
    positions: &HashMap<FieldId, (u32, usize)>,
    issue: &Issue,
) -> SortKey {
    let missing_rank = u8::from(!issue.has_code(codes::REQUIRED_MISSING));
    let (group_order, decl) = match &issue.scope {
        IssueScope::Field(id) => positions.get(id).copied().unwrap_or((u32::MAX, usize::MAX)),
        IssueScope::Group(id) => {
            let order = document.form().group(id).map_or(u32::MAX, |g| g.order);
            (order, usize::MAX - 1)
        }
        IssueScope::Form(_) => (u32::MAX, usize::MAX),
    };
    (
        missing_rank,
        group_order,
        decl,
        issue.severity.rank(),
        issue.message.clone(),
    )
}

/// Count the issues that block completion
///
/// Only error-severity issues on required fields block; warnings and info
/// never do, whatever their scope.
#[must_use]
pub fn blocking_issue_count(document: &Document, issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter(|issue| is_blocking(document, issue))
        .count()
}

/// Whether a single issue blocks completion
#[must_use]
pub fn is_blocking(document: &Document, issue: &Issue) -> bool {
    if issue.severity != Severity::Error {
        return false;
    }
    match issue.scope.field_id() {
        Some(id) => document
            .form()
            .field(id)
            .map(|f| f.constraints.required)
            .unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_model::{Constraints, Field, Form, Group, Response, ValidatorRef, Value};

    fn phased_doc() -> Document {
        Document::new(Form::new(
            "f",
            vec![
                Group::new("late")
                    .with_order(2)
                    .with_field(Field::text("late_name").required()),
                Group::new("early")
                    .with_order(0)
                    .with_field(Field::text("first").required())
                    .with_field(Field::text("second").required()),
            ],
        ))
    }

    #[test]
    fn issues_ordered_by_phase_then_declaration() {
        let doc = phased_doc();
        let issues = compute_issues(&doc, &ValidatorRegistry::new());
        let ids: Vec<&str> = issues
            .iter()
            .filter_map(|i| i.scope.field_id().map(FieldId::as_str))
            .collect();
        assert_eq!(ids, vec!["first", "second", "late_name"]);
    }

    #[test]
    fn required_missing_sorts_before_other_errors() {
        let mut doc = phased_doc();
        // Give `first` a nonconformant answer; `second` stays missing.
        doc.replace_response(
            &FieldId::from("first"),
            Response::answered(Value::Number(3.0)),
        )
        .unwrap();
        let issues = compute_issues(&doc, &ValidatorRegistry::new());
        assert!(issues[0].has_code(codes::REQUIRED_MISSING));
        assert_eq!(issues[0].scope.field_id().unwrap().as_str(), "second");
    }

    #[test]
    fn unknown_validator_surfaces_info_issue() {
        let doc = Document::new(Form::new(
            "f",
            vec![Group::new("g")
                .with_field(Field::text("x").with_validator(ValidatorRef::new("missing")))],
        ));
        let issues = compute_issues(&doc, &ValidatorRegistry::new());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].has_code(codes::UNKNOWN_VALIDATOR));
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn blocking_count_ignores_warnings_and_optional_fields() {
        let mut doc = Document::new(Form::new(
            "f",
            vec![Group::new("g")
                .with_field(Field::text("req").required())
                .with_field(
                    Field::text("opt")
                        .with_constraints(Constraints::new().with_len(Some(2), None)),
                )],
        ));
        // Optional field with a nonconformant answer: error issue, not blocking.
        doc.replace_response(
            &FieldId::from("opt"),
            Response::answered(Value::Text("x".into())),
        )
        .unwrap();
        let issues = compute_issues(&doc, &ValidatorRegistry::new());
        assert_eq!(issues.len(), 2);
        assert_eq!(blocking_issue_count(&doc, &issues), 1);
    }

    #[test]
    fn custom_validator_runs_over_scope() {
        let mut doc = Document::new(Form::new(
            "f",
            vec![Group::new("g").with_field(
                Field::text("bio").with_validator(
                    ValidatorRef::new("word_count")
                        .with_params(serde_json::json!({ "max": 2 })),
                ),
            )],
        ));
        doc.replace_response(
            &FieldId::from("bio"),
            Response::answered(Value::Text("way too many words".into())),
        )
        .unwrap();
        let issues = compute_issues(&doc, &ValidatorRegistry::with_defaults());
        assert!(issues.iter().any(|i| i.has_code("word_count")));
    }

    #[test]
    fn scoped_filter_excludes_other_phases() {
        let doc = phased_doc();
        let filter = FieldFilter::fields([FieldId::from("first"), FieldId::from("second")]);
        let issues = compute_issues_scoped(&doc, &ValidatorRegistry::new(), &filter);
        assert!(issues
            .iter()
            .all(|i| i.scope.field_id().unwrap().as_str() != "late_name"));
    }
}
