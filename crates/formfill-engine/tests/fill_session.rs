//! End-to-end fill session scenarios

use formfill_engine::prelude::*;
use formfill_model::{Document, FieldId, Response, Value};
use formfill_test_utils::{
    contact_form, parallel_form, phased_form, FailNTimesFiller, ScriptedFiller, SolverFiller,
    StalledFiller,
};
use formfill_validate::ValidatorRegistry;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn session(document: Document, filler: Arc<dyn Filler>, config: SessionConfig) -> FillSession {
    formfill_test_utils::init_tracing();
    FillSession::new(document, filler, ValidatorRegistry::with_defaults(), config)
}

#[tokio::test]
async fn rejected_patch_resurfaces_until_fixed() {
    // Turn 0 proposes an empty name, which fails the length constraint and
    // must leave the field unanswered; turn 1 fixes everything.
    let filler = Arc::new(ScriptedFiller::of_patches([
        vec![formfill_model::Patch::set("name", json!(""))],
        vec![
            formfill_model::Patch::set("name", json!("Alice")),
            formfill_model::Patch::set("site", json!("https://alice.dev")),
            formfill_model::Patch::set(
                "experience",
                json!([{ "employer": "Acme", "years": 3 }]),
            ),
        ],
    ]));
    let report = session(
        Document::new(contact_form()),
        filler.clone(),
        SessionConfig::new(),
    )
    .run()
    .await;

    assert_eq!(report.status, SessionStatus::Complete);
    assert_eq!(report.turns_used, 2);

    let first = &report.record.entries()[0];
    assert_eq!(first.applied.len(), 0);
    assert_eq!(first.rejected.len(), 1);
    assert_eq!(first.rejected[0].field_id, FieldId::from("name"));

    // The rejected set never touched the document; turn 1 still saw the
    // field unanswered.
    let second_request = &filler.requests()[1];
    let name_schema = second_request
        .fields
        .iter()
        .find(|f| f.id.as_str() == "name")
        .unwrap();
    assert_eq!(name_schema.response, Response::Unanswered);

    assert_eq!(
        report.document.response(&FieldId::from("name")).unwrap().value(),
        Some(&Value::Text("Alice".into()))
    );
}

#[tokio::test]
async fn max_turns_total_stops_after_one_answer() {
    let report = session(
        Document::new(phased_form()),
        Arc::new(SolverFiller),
        SessionConfig::new()
            .with_max_turns(1)
            .with_max_issues_per_turn(1),
    )
    .run()
    .await;

    assert_eq!(report.status, SessionStatus::MaxTurnsReached);
    assert_eq!(report.turns_used, 1);
    assert_eq!(report.document.answered_count(), 1);
    assert!(!report.last_issues.is_empty());

    // The snapshot round-trips; a fresh session could pick it up.
    let wire = serde_json::to_string(&report.document).unwrap();
    let restored: Document = serde_json::from_str(&wire).unwrap();
    assert_eq!(restored, report.document);
}

#[tokio::test]
async fn phases_fill_in_order() {
    let filler = Arc::new(ScriptedFiller::of_patches([
        vec![
            formfill_model::Patch::set("first_name", json!("Ada")),
            formfill_model::Patch::set("last_name", json!("Lovelace")),
        ],
        vec![
            formfill_model::Patch::set("bio", json!("analyst")),
            formfill_model::Patch::set("birth_year", json!(1815)),
        ],
    ]));
    let report = session(
        Document::new(phased_form()),
        filler.clone(),
        SessionConfig::new(),
    )
    .run()
    .await;
    assert_eq!(report.status, SessionStatus::Complete);

    // No second-phase issue surfaces while the first phase is unresolved.
    let requests = filler.requests();
    let phase_one_fields = ["bio", "birth_year"];
    let first_phase_turns = requests
        .iter()
        .take_while(|r| {
            r.issues.iter().any(|i| {
                i.scope
                    .field_id()
                    .is_some_and(|id| !phase_one_fields.contains(&id.as_str()))
            })
        })
        .count();
    assert!(first_phase_turns >= 1);
    for request in &requests[..first_phase_turns] {
        for issue in &request.issues {
            let id = issue.scope.field_id().unwrap();
            assert!(
                !phase_one_fields.contains(&id.as_str()),
                "phase 1 issue {id} surfaced before phase 0 settled"
            );
        }
    }
}

#[tokio::test]
async fn parallel_width_does_not_change_result() {
    let mut finals = Vec::new();
    for width in [1usize, 4] {
        let report = session(
            Document::new(parallel_form(6)),
            Arc::new(SolverFiller),
            SessionConfig::new().with_max_parallel_agents(width),
        )
        .run()
        .await;
        assert_eq!(report.status, SessionStatus::Complete);
        assert_eq!(report.group_outcomes.len(), 6);
        assert!(report
            .group_outcomes
            .values()
            .all(|s| *s == SessionStatus::Complete));
        finals.push(report.document.responses().clone());
    }
    assert_eq!(finals[0], finals[1]);
}

#[tokio::test]
async fn batch_limit_then_resume_to_completion() {
    let first = session(
        Document::new(contact_form()),
        Arc::new(SolverFiller),
        SessionConfig::new()
            .with_max_turns_this_call(1)
            .with_max_issues_per_turn(1),
    )
    .run()
    .await;
    assert_eq!(first.status, SessionStatus::BatchLimitReached);
    assert!(first.status.is_resumable());

    // Resume from the serialized snapshot only.
    let wire = serde_json::to_string(&first.document).unwrap();
    let restored: Document = serde_json::from_str(&wire).unwrap();
    let resumed = session(
        restored,
        Arc::new(SolverFiller),
        SessionConfig::new().starting_at(first.next_turn_number),
    )
    .run()
    .await;

    assert_eq!(resumed.status, SessionStatus::Complete);
    // Absolute turn numbers keep counting across the two calls.
    let first_resumed_turn = resumed.record.entries()[0].turn_number;
    assert_eq!(first_resumed_turn, first.next_turn_number);
}

#[tokio::test]
async fn transient_filler_failures_are_retried() {
    let report = session(
        Document::new(parallel_form(2)),
        Arc::new(FailNTimesFiller::new(2, SolverFiller)),
        SessionConfig::new().with_filler_retries(2),
    )
    .run()
    .await;
    assert_eq!(report.status, SessionStatus::Complete);
}

#[tokio::test]
async fn exhausted_retries_terminate_with_error() {
    let report = session(
        Document::new(parallel_form(2)),
        Arc::new(FailNTimesFiller::new(10, SolverFiller)),
        SessionConfig::new().with_filler_retries(1),
    )
    .run()
    .await;
    assert!(report.status.is_error());
    let SessionStatus::Error { message, cause } = &report.status else {
        panic!("expected error status");
    };
    assert!(message.contains("retries exhausted"));
    assert!(cause.iter().any(|c| c.contains("transient")));
}

#[tokio::test]
async fn cancellation_reaches_parallel_sub_sessions() {
    let fill = session(
        Document::new(parallel_form(4)),
        Arc::new(StalledFiller),
        SessionConfig::new(),
    );
    let cancel = fill.cancel_token();
    let handle = tokio::spawn(async move { fill.run().await });
    tokio::task::yield_now().await;
    cancel.cancel();
    let report = handle.await.unwrap();
    assert_eq!(report.status, SessionStatus::Cancelled);
    assert_eq!(report.document.answered_count(), 0);
}

#[tokio::test]
async fn skip_satisfies_required_field_with_warning() {
    let filler = Arc::new(ScriptedFiller::of_patches([vec![
        formfill_model::Patch::set("name", json!("Alice")),
        formfill_model::Patch::set("site", json!("https://alice.dev")),
        formfill_model::Patch::skip("experience", "no work history provided"),
    ]]));
    let report = session(Document::new(contact_form()), filler, SessionConfig::new())
        .run()
        .await;

    // A skipped required field no longer blocks, but leaves a warning.
    assert_eq!(report.status, SessionStatus::Complete);
    assert!(report
        .last_issues
        .iter()
        .any(|i| i.has_code(formfill_validate::codes::SKIPPED_REQUIRED)));
    assert!(matches!(
        report.document.response(&FieldId::from("experience")),
        Some(Response::Skipped { .. })
    ));
}

#[tokio::test]
async fn overflow_patches_defer_to_next_turn() {
    let report = session(
        Document::new(phased_form()),
        Arc::new(SolverFiller),
        SessionConfig::new().with_max_patches_per_turn(1),
    )
    .run()
    .await;
    assert_eq!(report.status, SessionStatus::Complete);
    assert_eq!(report.document.answered_count(), 4);
    // One patch per turn means at least four turns.
    assert!(report.turns_used >= 4);
}
