//! Testing utilities for the Formfill workspace
//!
//! Shared fillers and form fixtures used by the engine's tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use formfill_engine::{Filler, FillerError, PatchProposal, TurnRequest};
use formfill_model::{
    ColumnDef, ColumnKind, Constraints, Field, FieldKind, Form, Group, Patch,
};
use parking_lot::Mutex;
use serde_json::{json, Value as Json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Replays a fixed queue of proposals, one per turn, recording every
/// request it receives. Returns an empty proposal once the queue is dry.
#[derive(Debug, Default)]
pub struct ScriptedFiller {
    script: Mutex<VecDeque<PatchProposal>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedFiller {
    pub fn new(proposals: impl IntoIterator<Item = PatchProposal>) -> Self {
        Self {
            script: Mutex::new(proposals.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn of_patches(batches: impl IntoIterator<Item = Vec<Patch>>) -> Self {
        Self::new(batches.into_iter().map(PatchProposal::of))
    }

    /// Every request seen so far, in arrival order
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Filler for ScriptedFiller {
    async fn propose(&self, turn: TurnRequest) -> Result<PatchProposal, FillerError> {
        self.requests.lock().push(turn);
        Ok(self.script.lock().pop_front().unwrap_or_default())
    }
}

/// Fails the first `n` calls with a retryable error, then delegates
#[derive(Debug)]
pub struct FailNTimesFiller<F> {
    remaining_failures: AtomicU32,
    inner: F,
}

impl<F> FailNTimesFiller<F> {
    pub fn new(n: u32, inner: F) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
            inner,
        }
    }
}

#[async_trait]
impl<F: Filler> Filler for FailNTimesFiller<F> {
    async fn propose(&self, turn: TurnRequest) -> Result<PatchProposal, FillerError> {
        let took_failure = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took_failure {
            return Err(FillerError::retryable("simulated transient failure"));
        }
        self.inner.propose(turn).await
    }
}

/// Never answers; parks until the session is cancelled
#[derive(Debug, Default)]
pub struct StalledFiller;

#[async_trait]
impl Filler for StalledFiller {
    async fn propose(&self, _turn: TurnRequest) -> Result<PatchProposal, FillerError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Answers every field-scoped issue with a value plausible for the field's
/// kind, so any fixture can be driven to completion
#[derive(Debug, Default)]
pub struct SolverFiller;

impl SolverFiller {
    fn plausible_value(schema: &formfill_engine::FieldSchema) -> Json {
        match &schema.kind {
            FieldKind::Text => json!("Alice"),
            FieldKind::Number => {
                let min = schema.constraints.min_value.unwrap_or(0.0);
                let max = schema.constraints.max_value.unwrap_or(min + 84.0);
                json!((min + max) / 2.0)
            }
            FieldKind::TextList => json!(["first entry"]),
            FieldKind::SingleChoice => {
                json!(schema.options.first().map_or("", |o| o.id.as_str()))
            }
            FieldKind::MultiChoice => {
                json!(schema.options.first().map_or(vec![], |o| vec![o.id.clone()]))
            }
            FieldKind::CheckboxSet { .. } => {
                let states: serde_json::Map<String, Json> = schema
                    .options
                    .iter()
                    .map(|o| (o.id.clone(), json!("checked")))
                    .collect();
                Json::Object(states)
            }
            FieldKind::Url => json!("https://example.com"),
            FieldKind::UrlList => json!(["https://example.com"]),
            FieldKind::Date => json!("2024-01-15"),
            FieldKind::Year => json!(2024),
            FieldKind::Table { columns } => {
                let row: serde_json::Map<String, Json> = columns
                    .iter()
                    .map(|c| {
                        let cell = match c.kind {
                            ColumnKind::Text => json!("cell"),
                            ColumnKind::Number => json!(1.0),
                            ColumnKind::Date => json!("2024-01-15"),
                            ColumnKind::Checkbox => json!(true),
                        };
                        (c.id.clone(), cell)
                    })
                    .collect();
                let rows = schema.constraints.min_rows.unwrap_or(1).max(1);
                json!(vec![Json::Object(row); rows])
            }
        }
    }
}

#[async_trait]
impl Filler for SolverFiller {
    async fn propose(&self, turn: TurnRequest) -> Result<PatchProposal, FillerError> {
        let mut patches = Vec::new();
        for issue in &turn.issues {
            let Some(id) = issue.scope.field_id() else {
                continue;
            };
            let Some(schema) = turn.fields.iter().find(|f| &f.id == id) else {
                continue;
            };
            patches.push(Patch::set(id.clone(), Self::plausible_value(schema)));
        }
        Ok(PatchProposal::of(patches))
    }
}

/// Single-group contact form: required name, optional age, required URL,
/// and a required experience table with bounded rows
pub fn contact_form() -> Form {
    Form::new(
        "contact",
        vec![Group::new("contact")
            .with_title("Contact details")
            .with_field(
                Field::text("name")
                    .with_label("Full name")
                    .required()
                    .with_constraints(Constraints::new().required().with_len(Some(1), Some(80))),
            )
            .with_field(
                Field::number("age")
                    .with_constraints(Constraints::new().with_value_range(Some(0.0), Some(150.0))),
            )
            .with_field(Field::new("site", FieldKind::Url).required())
            .with_field(
                Field::table(
                    "experience",
                    vec![
                        ColumnDef::new("employer", ColumnKind::Text).required(),
                        ColumnDef::new("years", ColumnKind::Number),
                    ],
                )
                .required()
                .with_constraints(Constraints::new().required().with_rows(Some(1), Some(10))),
            )],
    )
}

/// Two-phase form: basics at order 0, details at order 1
pub fn phased_form() -> Form {
    Form::new(
        "phased",
        vec![
            Group::new("basics")
                .with_order(0)
                .with_field(Field::text("first_name").required())
                .with_field(Field::text("last_name").required()),
            Group::new("details")
                .with_order(1)
                .with_field(Field::text("bio").required())
                .with_field(Field::new("birth_year", FieldKind::Year).required()),
        ],
    )
}

/// One phase of `width` independent groups sharing a batch id, one
/// required text field each
pub fn parallel_form(width: usize) -> Form {
    let groups = (0..width)
        .map(|i| {
            Group::new(format!("section_{i}").as_str())
                .in_batch("sections")
                .with_field(Field::text(format!("answer_{i}")).required())
        })
        .collect();
    Form::new("parallel", groups)
}
