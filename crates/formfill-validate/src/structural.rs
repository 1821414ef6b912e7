//! Structural validation pass
//!
//! Derives issues purely from the field constraint set and the current
//! response: required-but-unanswered, nonconformant stored values,
//! skipped/aborted required fields.

use crate::filter::FieldFilter;
use crate::issue::{codes, Issue};
use formfill_model::{conformance, Document, Response};

/// Compute structural issues for every admitted field
#[must_use]
pub fn structural_issues(document: &Document, filter: &FieldFilter) -> Vec<Issue> {
    let mut issues = Vec::new();

    for field in document.form().fields() {
        if !filter.admits(field) {
            continue;
        }
        let Some(response) = document.response(&field.id) else {
            continue;
        };

        match response {
            Response::Unanswered => {
                if field.constraints.required {
                    issues.push(
                        Issue::field_error(
                            field.id.clone(),
                            format!("required field `{}` is unanswered", field.id),
                        )
                        .with_code(codes::REQUIRED_MISSING),
                    );
                }
            }
            Response::Answered { value } => {
                let verdict = conformance::check(field, value);
                for reason in verdict.reasons() {
                    issues.push(
                        Issue::field_error(
                            field.id.clone(),
                            format!("field `{}`: {reason}", field.id),
                        )
                        .with_code(codes::NONCONFORMANT),
                    );
                }
            }
            Response::Skipped { reason } => {
                if field.constraints.required {
                    issues.push(
                        Issue::field_warning(
                            field.id.clone(),
                            format!("required field `{}` was skipped: {reason}", field.id),
                        )
                        .with_code(codes::SKIPPED_REQUIRED),
                    );
                }
            }
            Response::Aborted { reason } => {
                if field.constraints.required {
                    issues.push(
                        Issue::field_warning(
                            field.id.clone(),
                            format!("required field `{}` was aborted: {reason}", field.id),
                        )
                        .with_code(codes::ABORTED_REQUIRED),
                    );
                }
            }
        }
    }

    issues
}
