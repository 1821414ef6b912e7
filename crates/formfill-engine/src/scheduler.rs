//! Fill scheduler
//!
//! Drives form completion through repeated (issue, patch) turns:
//! - compute prioritized issues for the active scope
//! - hand issues + schema to the filler and await its patch batch (the only
//!   suspension point)
//! - apply patches under the single document critical section
//! - record the turn, enforce turn/batch budgets, loop
//!
//! Groups are partitioned by `order` into sequential phases; within a phase,
//! groups carrying a parallel batch id run as independent sub-sessions on a
//! worker pool bounded by `max_parallel_agents`, and the phase releases only
//! once all of them reach a terminal state. Issue computation and filler
//! calls run concurrently across sub-sessions, but every patch-apply for the
//! whole document is serialized behind one mutex, so no two sub-sessions
//! ever interleave writes.

use crate::cancel::CancelToken;
use crate::config::{FillMode, SessionConfig};
use crate::error::EngineError;
use crate::filler::{FieldSchema, Filler, PatchProposal, TurnRequest};
use crate::record::{FillRecord, TurnEntry};
use crate::session::{SessionId, SessionReport, SessionStatus};
use chrono::Utc;
use dashmap::DashMap;
use formfill_model::{Document, FieldId, Group, GroupId, Patch};
use formfill_validate::{
    blocking_issue_count, compute_issues_scoped, FieldFilter, ValidatorRegistry,
};
use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

/// How one scope's turn loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeEnd {
    Complete,
    MaxTurns,
    BatchLimit,
    Cancelled,
}

fn scope_status(end: ScopeEnd) -> SessionStatus {
    match end {
        ScopeEnd::Complete => SessionStatus::Complete,
        ScopeEnd::MaxTurns => SessionStatus::MaxTurnsReached,
        ScopeEnd::BatchLimit => SessionStatus::BatchLimitReached,
        ScopeEnd::Cancelled => SessionStatus::Cancelled,
    }
}

/// One fill session over one document
///
/// All shared state lives behind `Arc`s, so the session clones cheaply into
/// sub-session tasks. No state survives `run`; resumption works solely by
/// re-submitting the serialized document with a bumped starting turn.
#[derive(Clone)]
pub struct FillSession {
    id: SessionId,
    config: Arc<SessionConfig>,
    registry: Arc<ValidatorRegistry>,
    filler: Arc<dyn Filler>,
    /// The single critical section for every document mutation
    document: Arc<AsyncMutex<Document>>,
    record: Arc<SyncMutex<FillRecord>>,
    cancel: CancelToken,
    /// Turns taken this call, shared across sub-sessions
    turns_taken: Arc<AtomicU32>,
    group_outcomes: Arc<DashMap<GroupId, SessionStatus>>,
}

impl std::fmt::Debug for FillSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FillSession {
    /// Create new session over a document
    #[must_use]
    pub fn new(
        document: Document,
        filler: Arc<dyn Filler>,
        registry: ValidatorRegistry,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            config: Arc::new(config),
            registry: Arc::new(registry),
            filler,
            document: Arc::new(AsyncMutex::new(document)),
            record: Arc::new(SyncMutex::new(FillRecord::new())),
            cancel: CancelToken::new(),
            turns_taken: Arc::new(AtomicU32::new(0)),
            group_outcomes: Arc::new(DashMap::new()),
        }
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Session identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Handle for signalling cancellation from outside
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the session to a terminal status
    pub async fn run(&self) -> SessionReport {
        self.record.lock().start();
        {
            let doc = self.document.lock().await;
            tracing::info!(
                session = %self.id,
                form = %doc.form().id(),
                fields = doc.form().field_count(),
                "fill session started"
            );
        }

        let status = match self.run_phases().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "fill session failed");
                SessionStatus::from_engine_error(&e)
            }
        };
        self.record.lock().finish(status.clone());

        let document = self.document.lock().await.clone();
        let last_issues = compute_issues_scoped(&document, &self.registry, &self.global_filter());
        let record = self.record.lock().clone();
        let turns_used = record.turns_recorded() as u32;
        tracing::info!(
            session = %self.id,
            ?status,
            turns = turns_used,
            outstanding = last_issues.len(),
            "fill session finished"
        );

        SessionReport {
            session_id: self.id,
            status,
            turns_used,
            next_turn_number: self.config.starting_turn_number + turns_used,
            last_issues,
            group_outcomes: self
                .group_outcomes
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
            record,
            document,
        }
    }

    /// Sequential phases, parallel sub-sessions within a phase, final sweep
    async fn run_phases(&self) -> Result<SessionStatus, EngineError> {
        if self.config.fill_mode == FillMode::Overwrite {
            self.reset_targeted().await;
        }

        let form = self.document.lock().await.form().clone();

        for order in form.phase_orders() {
            let phase_groups: Vec<Group> = form
                .groups()
                .iter()
                .filter(|g| g.order == order)
                .cloned()
                .collect();

            // Groups without a batch id fill as one combined sequential scope.
            let sequential: Vec<FieldId> = phase_groups
                .iter()
                .filter(|g| g.parallel_batch.is_none())
                .flat_map(|g| g.fields.iter().map(|f| f.id.clone()))
                .collect();
            if !sequential.is_empty() {
                match self.run_scope(None, sequential).await? {
                    ScopeEnd::Cancelled => return Ok(SessionStatus::Cancelled),
                    // Budget exhaustion is terminal for the scope, not the
                    // phase; later phases still get their (empty) budget.
                    ScopeEnd::Complete | ScopeEnd::MaxTurns | ScopeEnd::BatchLimit => {}
                }
            }

            let parallel: Vec<Group> = phase_groups
                .into_iter()
                .filter(|g| g.parallel_batch.is_some())
                .collect();
            if !parallel.is_empty() {
                self.run_parallel(parallel).await?;
                if self.cancel.is_cancelled() {
                    return Ok(SessionStatus::Cancelled);
                }
            }
        }

        // Cross-field validators can surface issues spanning phases once the
        // later answers exist; sweep the whole targeted scope to finish. With
        // budgets already exhausted this reduces to the final status check.
        let all_fields: Vec<FieldId> = form.fields().map(|f| f.id.clone()).collect();
        Ok(scope_status(self.run_scope(None, all_fields).await?))
    }

    /// Spawn one sub-session per group on the bounded worker pool and wait
    /// on the phase barrier
    async fn run_parallel(&self, groups: Vec<Group>) -> Result<(), EngineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_agents));
        let mut handles = Vec::with_capacity(groups.len());

        for group in groups {
            let session = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let gid = group.id.clone();
            let fields: Vec<FieldId> = group.fields.iter().map(|f| f.id.clone()).collect();
            handles.push(tokio::spawn(async move {
                let end = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let _permit = permit;
                        session.run_scope(Some(gid.clone()), fields).await
                    }
                    Err(_) => Err(EngineError::Invariant("worker pool closed".into())),
                };
                if end.is_err() {
                    // Stop siblings at their next suspension point.
                    session.cancel.cancel();
                }
                (gid, end)
            }));
        }

        // Phase barrier: every sub-session reaches a terminal state.
        let results = futures::future::join_all(handles).await;

        let mut first_error = None;
        for result in results {
            let (gid, end) = result.map_err(|e| EngineError::SubSession(e.to_string()))?;
            match end {
                Ok(end) => {
                    self.group_outcomes.insert(gid, scope_status(end));
                }
                Err(e) => {
                    self.group_outcomes
                        .insert(gid, SessionStatus::from_engine_error(&e));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Single-scope turn loop
    async fn run_scope(
        &self,
        group: Option<GroupId>,
        scope_fields: Vec<FieldId>,
    ) -> Result<ScopeEnd, EngineError> {
        let filter = self.scope_filter(&scope_fields);
        let mut deferred: VecDeque<Patch> = VecDeque::new();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(ScopeEnd::Cancelled);
            }

            let snapshot = self.document.lock().await.clone();
            let issues = compute_issues_scoped(&snapshot, &self.registry, &filter);
            if blocking_issue_count(&snapshot, &issues) == 0 {
                return Ok(ScopeEnd::Complete);
            }

            let turn_number = match self.try_take_turn() {
                Ok(n) => n,
                Err(end) => return Ok(end),
            };

            let capped: Vec<_> = issues
                .iter()
                .take(self.config.max_issues_per_turn)
                .cloned()
                .collect();
            tracing::debug!(
                session = %self.id,
                turn = turn_number,
                group = group.as_ref().map(GroupId::as_str),
                issues = capped.len(),
                "turn start"
            );

            let request = TurnRequest {
                session_id: self.id,
                turn_number,
                group_id: group.clone(),
                issues: capped.clone(),
                fields: FieldSchema::for_fields(&snapshot, &scope_fields),
            };
            let Some(proposal) = self.propose_with_retry(request).await? else {
                return Ok(ScopeEnd::Cancelled);
            };

            // Deferred overflow from the previous turn applies first.
            let mut pending: Vec<Patch> = deferred.drain(..).collect();
            pending.extend(proposal.patches);
            let overflow = pending.split_off(pending.len().min(self.config.max_patches_per_turn));
            deferred.extend(overflow);

            // Observe cancellation before the critical section, never inside
            // it; an in-flight apply stays all-or-nothing.
            if self.cancel.is_cancelled() {
                return Ok(ScopeEnd::Cancelled);
            }
            let outcome = {
                let mut doc = self.document.lock().await;
                formfill_patch::apply(&mut doc, &pending)
            };
            tracing::debug!(
                session = %self.id,
                turn = turn_number,
                applied = outcome.applied_count(),
                rejected = outcome.rejected_count(),
                deferred = deferred.len(),
                "turn applied"
            );

            self.record.lock().record_turn(TurnEntry {
                turn_number,
                group: group.clone(),
                issues_presented: capped.len(),
                applied: outcome.applied,
                rejected: outcome.rejected,
                usage: proposal.usage,
                at: Utc::now(),
            });
        }
    }

    /// Call the filler, retrying retryable failures; `None` means cancelled
    async fn propose_with_retry(
        &self,
        request: TurnRequest,
    ) -> Result<Option<PatchProposal>, EngineError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = tokio::select! {
                () = self.cancel.cancelled() => return Ok(None),
                result = self.filler.propose(request.clone()) => result,
            };
            match result {
                Ok(proposal) => return Ok(Some(proposal)),
                Err(e) if e.is_retryable() && attempts <= self.config.filler_retries => {
                    tracing::warn!(
                        session = %self.id,
                        attempt = attempts,
                        error = %e,
                        "filler call failed, retrying"
                    );
                }
                Err(e) if e.is_retryable() => {
                    return Err(EngineError::FillerExhausted {
                        attempts,
                        source: e,
                    })
                }
                Err(e) => return Err(EngineError::Filler(e)),
            }
        }
    }

    /// Reserve the next turn number or report which budget ran out
    fn try_take_turn(&self) -> Result<u32, ScopeEnd> {
        let used = self.turns_taken.fetch_add(1, Ordering::SeqCst);
        let absolute = self.config.starting_turn_number.saturating_add(used);
        if absolute >= self.config.max_turns_total {
            self.turns_taken.fetch_sub(1, Ordering::SeqCst);
            return Err(ScopeEnd::MaxTurns);
        }
        if let Some(cap) = self.config.max_turns_this_call {
            if used >= cap {
                self.turns_taken.fetch_sub(1, Ordering::SeqCst);
                return Err(ScopeEnd::BatchLimit);
            }
        }
        Ok(absolute)
    }

    fn scope_filter(&self, fields: &[FieldId]) -> FieldFilter {
        let filter = FieldFilter::fields(fields.iter().cloned());
        match &self.config.target_roles {
            Some(roles) => filter.with_roles(roles.clone()),
            None => filter,
        }
    }

    fn global_filter(&self) -> FieldFilter {
        match &self.config.target_roles {
            Some(roles) => FieldFilter::all().with_roles(roles.clone()),
            None => FieldFilter::all(),
        }
    }

    /// Overwrite mode: reset every targeted field before the first turn
    async fn reset_targeted(&self) {
        let filter = self.global_filter();
        let mut doc = self.document.lock().await;
        let ids: Vec<FieldId> = doc
            .form()
            .fields()
            .filter(|f| filter.admits(f))
            .map(|f| f.id.clone())
            .collect();
        for id in ids {
            let _ = doc.reset_response(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FillerError;
    use async_trait::async_trait;
    use formfill_model::{Field, Form, Group, Response, Value};
    use serde_json::json;

    /// Answers any required-missing issue with the field id as text
    struct EchoFiller;

    #[async_trait]
    impl Filler for EchoFiller {
        async fn propose(&self, turn: TurnRequest) -> Result<PatchProposal, FillerError> {
            let patches = turn
                .issues
                .iter()
                .filter_map(|issue| issue.scope.field_id())
                .map(|id| Patch::set(id.clone(), json!(id.as_str())))
                .collect();
            Ok(PatchProposal::of(patches))
        }
    }

    /// Never answers; parks until cancelled
    struct StalledFiller;

    #[async_trait]
    impl Filler for StalledFiller {
        async fn propose(&self, _turn: TurnRequest) -> Result<PatchProposal, FillerError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn two_field_doc() -> Document {
        Document::new(Form::new(
            "f",
            vec![Group::new("g")
                .with_field(Field::text("a").required())
                .with_field(Field::text("b").required())],
        ))
    }

    #[tokio::test]
    async fn session_completes_simple_form() {
        let session = FillSession::new(
            two_field_doc(),
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new(),
        );
        let report = session.run().await;
        assert_eq!(report.status, SessionStatus::Complete);
        assert_eq!(report.document.answered_count(), 2);
        assert!(report.last_issues.is_empty());
    }

    #[tokio::test]
    async fn one_issue_per_turn_hits_max_turns() {
        let session = FillSession::new(
            two_field_doc(),
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new()
                .with_max_turns(1)
                .with_max_issues_per_turn(1),
        );
        let report = session.run().await;
        assert_eq!(report.status, SessionStatus::MaxTurnsReached);
        assert_eq!(report.turns_used, 1);
        assert_eq!(report.document.answered_count(), 1);
    }

    #[tokio::test]
    async fn batch_limit_is_resumable() {
        let session = FillSession::new(
            two_field_doc(),
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new()
                .with_max_turns_this_call(1)
                .with_max_issues_per_turn(1),
        );
        let report = session.run().await;
        assert_eq!(report.status, SessionStatus::BatchLimitReached);
        assert!(report.status.is_resumable());
        assert_eq!(report.next_turn_number, 1);

        // Resume from the snapshot with the bumped starting turn.
        let resumed = FillSession::new(
            report.document,
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new()
                .starting_at(report.next_turn_number)
                .with_max_issues_per_turn(1),
        );
        let report = resumed.run().await;
        assert_eq!(report.status, SessionStatus::Complete);
    }

    #[tokio::test]
    async fn cancellation_terminates_promptly() {
        let session = FillSession::new(
            two_field_doc(),
            Arc::new(StalledFiller),
            ValidatorRegistry::new(),
            SessionConfig::new(),
        );
        let cancel = session.cancel_token();
        let handle = tokio::spawn(async move { session.run().await });
        tokio::task::yield_now().await;
        cancel.cancel();
        let report = handle.await.unwrap();
        assert_eq!(report.status, SessionStatus::Cancelled);
        assert_eq!(report.document.answered_count(), 0);
    }

    #[tokio::test]
    async fn overwrite_mode_resets_prior_answers() {
        let mut doc = two_field_doc();
        doc.replace_response(
            &FieldId::from("a"),
            Response::answered(Value::Text("stale".into())),
        )
        .unwrap();

        let session = FillSession::new(
            doc,
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new().with_fill_mode(FillMode::Overwrite),
        );
        let report = session.run().await;
        assert_eq!(report.status, SessionStatus::Complete);
        assert_eq!(
            report.document.response(&FieldId::from("a")).unwrap().value(),
            Some(&Value::Text("a".into()))
        );
    }

    #[tokio::test]
    async fn target_roles_scope_completion() {
        let doc = Document::new(Form::new(
            "f",
            vec![Group::new("g")
                .with_field(Field::text("mine").required().with_role("hr"))
                .with_field(Field::text("theirs").required().with_role("legal"))],
        ));
        let session = FillSession::new(
            doc,
            Arc::new(EchoFiller),
            ValidatorRegistry::new(),
            SessionConfig::new().with_target_roles(vec!["hr".into()]),
        );
        let report = session.run().await;
        // The legal field is out of scope: untouched and not blocking.
        assert_eq!(report.status, SessionStatus::Complete);
        assert_eq!(
            report.document.response(&FieldId::from("theirs")).unwrap(),
            &Response::Unanswered
        );
    }
}
