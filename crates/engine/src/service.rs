//! The engine: approval orchestration and parallel-ledger fan-out.
//!
//! Every operation is request-scoped; there is no background scheduler.
//! Configuration travels as an immutable `Arc<ConfigSnapshot>`: each
//! operation reads the snapshot current at its start, and installing a
//! replacement (rate fixes, new rules) only affects later operations.
//! The approver roster is mutable separately, guarded by a read-write
//! lock so delegations can be granted at runtime.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use paraledger_shared::EngineConfig;
use paraledger_shared::types::{DocumentId, LedgerId, PostingId, UserId, WorkflowInstanceId};

use paraledger_core::approval::{Approver, Delegation, eligible_pool};
use paraledger_core::audit::{AuditAction, AuditRecord};
use paraledger_core::document::{Document, DocumentStatus, validate_document};
use paraledger_core::posting::{
    DerivedDocument, LedgerPostingDetail, ParallelPosting, PostingError, PostingOutcome,
    PostingStatus, derive_for_ledger,
};
use paraledger_core::registry::Ledger;
use paraledger_core::snapshot::ConfigSnapshot;
use paraledger_core::workflow::{
    Decision, DecisionOutcome, WorkflowError, WorkflowInstance, WorkflowService,
};

use crate::error::EngineError;
use crate::store::EngineStore;

/// Outcome summary returned by [`Engine::decide`].
#[derive(Debug, Clone)]
pub struct DecisionSummary {
    /// The decided instance.
    pub instance: WorkflowInstanceId,
    /// The document the instance governs.
    pub document: DocumentId,
    /// The recorded outcome.
    pub outcome: DecisionOutcome,
    /// Document status after all follow-on transitions.
    pub new_status: DocumentStatus,
    /// Fan-out result when the decision was an approval.
    pub posting: Option<PostingStatus>,
}

/// The approval-gated posting engine.
pub struct Engine {
    config: EngineConfig,
    snapshot: RwLock<Arc<ConfigSnapshot>>,
    roster: RwLock<Vec<Approver>>,
    store: EngineStore,
    workers: rayon::ThreadPool,
}

impl Engine {
    /// Creates an engine over a configuration snapshot and approver
    /// roster.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::WorkerPool` when the fan-out pool cannot
    /// be built.
    pub fn new(
        config: EngineConfig,
        snapshot: Arc<ConfigSnapshot>,
        roster: Vec<Approver>,
    ) -> Result<Self, EngineError> {
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(config.posting.fan_out_threads)
            .thread_name(|i| format!("posting-{i}"))
            .build()?;

        Ok(Self {
            config,
            snapshot: RwLock::new(snapshot),
            roster: RwLock::new(roster),
            store: EngineStore::new(),
            workers,
        })
    }

    /// The configuration snapshot current operations read.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Installs a new configuration snapshot.
    ///
    /// Takes effect for subsequent operations only; an operation already
    /// running keeps the snapshot it started with.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    pub fn replace_snapshot(&self, snapshot: Arc<ConfigSnapshot>) {
        *self.snapshot.write().expect("snapshot lock poisoned") = snapshot;
        info!("configuration snapshot replaced");
    }

    /// Submits a draft document for approval.
    ///
    /// Validates double-entry balance, resolves the required approval
    /// level from the routing amount, computes the eligible approver
    /// pool, and creates the workflow instance. The level and pool are
    /// snapshots; later configuration changes do not affect the
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `AlreadySubmitted` when the document
    /// has an open instance, `InvalidTransition` for non-draft
    /// documents, policy resolution errors, or `NoEligibleApprover`.
    ///
    /// # Panics
    ///
    /// Panics if the roster or an instance lock is poisoned.
    pub fn submit_document(
        &self,
        mut document: Document,
        submitter: UserId,
    ) -> Result<WorkflowInstanceId, EngineError> {
        validate_document(&document).map_err(WorkflowError::from)?;

        // One open instance per document. The stored status, not the
        // caller's copy, decides whether submission is a legal
        // transition, so stale copies of decided documents are rejected.
        if let Some(existing) = self.store.instance_for_document(document.id)
            && existing.lock().expect("instance lock poisoned").is_open()
        {
            return Err(WorkflowError::AlreadySubmitted(document.id).into());
        }
        let current_status = self
            .store
            .document(document.id)
            .map_or(document.status, |d| d.status);
        let action = WorkflowService::submit(current_status, submitter)?;

        let snapshot = self.current_snapshot();
        let level = snapshot
            .policy
            .resolve(document.key.company, document.routing_amount())
            .map_err(WorkflowError::from)?;

        let now = Utc::now();
        let pool = {
            let roster = self.roster.read().expect("roster lock poisoned");
            eligible_pool(&roster, document.key.company, level.order, now)
        };
        if pool.is_empty() {
            return Err(WorkflowError::NoEligibleApprover {
                company: document.key.company,
                level_order: level.order,
            }
            .into());
        }

        let from_status = current_status;
        document.status = action.new_status();
        document.submitter = Some(submitter);
        document.submitted_at = Some(now);

        let instance = WorkflowInstance {
            id: WorkflowInstanceId::new(),
            document_id: document.id,
            company: document.key.company,
            required_level_order: level.order,
            required_level_name: level.name.clone(),
            eligible_approvers: pool.clone(),
            submitter,
            submitted_at: now,
            deadline: Some(now + Duration::hours(self.config.approval.decision_deadline_hours)),
            decision: None,
        };
        let instance_id = instance.id;

        info!(
            document = %document.id,
            key = %document.key,
            amount = %document.routing_amount(),
            level = %level.name,
            pool_size = pool.len(),
            "document submitted for approval"
        );

        self.store.record_audit(AuditRecord::new(
            Some(document.id),
            Some(submitter),
            AuditAction::Submitted,
            Some(from_status),
            Some(document.status),
            None,
        ));
        self.store.put_document(document);
        self.store.put_instance(instance);

        Ok(instance_id)
    }

    /// Lists open instances the actor may decide.
    ///
    /// Excludes instances the actor submitted: segregation of duties
    /// applies to the worklist as well as to the decision itself.
    ///
    /// # Panics
    ///
    /// Panics if an instance lock is poisoned.
    #[must_use]
    pub fn list_pending_approvals(&self, actor: UserId) -> Vec<WorkflowInstance> {
        self.store
            .all_instances()
            .iter()
            .filter_map(|arc| {
                let instance = arc.lock().expect("instance lock poisoned");
                (instance.is_open()
                    && instance.submitter != actor
                    && instance.eligible_approvers.contains(&actor))
                .then(|| instance.clone())
            })
            .collect()
    }

    /// Lists open instances past their decision deadline.
    ///
    /// The engine never auto-escalates; external pollers act on this.
    ///
    /// # Panics
    ///
    /// Panics if an instance lock is poisoned.
    #[must_use]
    pub fn list_overdue(&self, now: DateTime<Utc>) -> Vec<WorkflowInstance> {
        self.store
            .all_instances()
            .iter()
            .filter_map(|arc| {
                let instance = arc.lock().expect("instance lock poisoned");
                instance.is_overdue(now).then(|| instance.clone())
            })
            .collect()
    }

    /// Applies an approval decision to an open instance.
    ///
    /// Concurrent calls serialize on the per-instance lock; the loser
    /// observes `AlreadyDecided`. An approval synchronously triggers the
    /// ledger fan-out. A rejection requires comments and returns the
    /// document to draft for revision.
    ///
    /// # Errors
    ///
    /// Returns authorization errors (`NotEligible`, `SelfApproval`),
    /// `AlreadyDecided`, `RejectionReasonRequired`, or transition
    /// errors.
    ///
    /// # Panics
    ///
    /// Panics if the instance lock is poisoned.
    pub fn decide(
        &self,
        instance_id: WorkflowInstanceId,
        actor: UserId,
        outcome: DecisionOutcome,
        comments: Option<String>,
    ) -> Result<DecisionSummary, EngineError> {
        let arc = self
            .store
            .instance(instance_id)
            .ok_or(WorkflowError::InstanceNotFound(instance_id))?;
        let mut instance = arc.lock().expect("instance lock poisoned");

        WorkflowService::authorize_decision(&instance, actor)?;
        let document_id = instance.document_id;
        let document = self
            .store
            .document(document_id)
            .ok_or(WorkflowError::DocumentNotFound(document_id))?;

        let now = Utc::now();
        match outcome {
            DecisionOutcome::Approved => {
                let action = WorkflowService::approve(document.status, actor, comments.clone())?;
                instance.decision = Some(Decision {
                    actor,
                    outcome,
                    comments: comments.clone(),
                    decided_at: now,
                });
                self.store.with_document_mut(document_id, |d| {
                    d.status = action.new_status();
                    d.approved_at = Some(now);
                });
                self.store.record_audit(AuditRecord::new(
                    Some(document_id),
                    Some(actor),
                    AuditAction::Approved,
                    Some(DocumentStatus::PendingApproval),
                    Some(DocumentStatus::Approved),
                    comments,
                ));
                info!(document = %document_id, approver = %actor, "document approved");

                let posting = self.post_approved(document_id)?;
                let new_status = self
                    .store
                    .document(document_id)
                    .map_or(DocumentStatus::Approved, |d| d.status);

                Ok(DecisionSummary {
                    instance: instance_id,
                    document: document_id,
                    outcome,
                    new_status,
                    posting: Some(posting),
                })
            }
            DecisionOutcome::Rejected => {
                let reason = comments.clone().unwrap_or_default();
                let action = WorkflowService::reject(document.status, actor, reason.clone())?;
                instance.decision = Some(Decision {
                    actor,
                    outcome,
                    comments,
                    decided_at: now,
                });
                self.store.with_document_mut(document_id, |d| {
                    d.status = action.new_status();
                    d.rejected_at = Some(now);
                });
                self.store.record_audit(AuditRecord::new(
                    Some(document_id),
                    Some(actor),
                    AuditAction::Rejected,
                    Some(DocumentStatus::PendingApproval),
                    Some(DocumentStatus::Rejected),
                    Some(reason),
                ));
                info!(document = %document_id, approver = %actor, "document rejected");

                // Rejected documents return to draft for revision.
                let reopen = WorkflowService::reopen(DocumentStatus::Rejected)?;
                self.store.with_document_mut(document_id, |d| {
                    d.status = reopen.new_status();
                });
                self.store.record_audit(AuditRecord::new(
                    Some(document_id),
                    None,
                    AuditAction::Reopened,
                    Some(DocumentStatus::Rejected),
                    Some(DocumentStatus::Draft),
                    None,
                ));

                Ok(DecisionSummary {
                    instance: instance_id,
                    document: document_id,
                    outcome,
                    new_status: DocumentStatus::Draft,
                    posting: None,
                })
            }
        }
    }

    /// Reports the posting status of a document across the non-leading
    /// ledgers. The leading ledger carries the source document itself
    /// and is not part of the fan-out report.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, or `NotApproved` when the document
    /// has not reached posting yet.
    pub fn get_posting_status(&self, document_id: DocumentId) -> Result<PostingStatus, EngineError> {
        let document = self
            .store
            .document(document_id)
            .ok_or(WorkflowError::DocumentNotFound(document_id))?;

        match document.status {
            DocumentStatus::Approved | DocumentStatus::Posted => Ok(self.build_status(document_id)),
            other => Err(PostingError::NotApproved(other).into()),
        }
    }

    /// Re-runs the fan-out for a document with failed ledger postings,
    /// typically after a configuration fix landed via
    /// [`Engine::replace_snapshot`].
    ///
    /// Successful (document, ledger) pairs stay untouched; failed pairs
    /// are derived again. A document held in Approved by
    /// `hold_until_all_ledgers` completes its transition to Posted once
    /// every ledger has succeeded.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, or `NotApproved` when the document
    /// has not reached posting yet.
    pub fn retry_posting(&self, document_id: DocumentId) -> Result<PostingStatus, EngineError> {
        let document = self
            .store
            .document(document_id)
            .ok_or(WorkflowError::DocumentNotFound(document_id))?;
        match document.status {
            DocumentStatus::Approved | DocumentStatus::Posted => {}
            other => return Err(PostingError::NotApproved(other).into()),
        }

        let status = self.fan_out(document_id)?;
        info!(
            document = %document_id,
            succeeded = status.success_count,
            targeted = status.ledger_count,
            "posting fan-out retried"
        );
        if document.status == DocumentStatus::Approved && status.is_complete() {
            self.mark_posted(document_id)?;
        }
        Ok(self.build_status(document_id))
    }

    /// Posts a draft document directly, bypassing approval.
    ///
    /// The override permission is a caller-supplied flag; the engine
    /// does not own identity. The bypass is loudly audited.
    ///
    /// # Errors
    ///
    /// Returns `MissingOverridePermission` without the flag, validation
    /// errors, or `InvalidTransition` for non-draft documents.
    pub fn emergency_post(
        &self,
        mut document: Document,
        actor: UserId,
        has_override_permission: bool,
    ) -> Result<PostingStatus, EngineError> {
        validate_document(&document).map_err(WorkflowError::from)?;
        let action =
            WorkflowService::emergency_post(document.status, actor, has_override_permission)?;

        let from_status = document.status;
        let document_id = document.id;
        document.status = action.new_status();
        document.posted_at = Some(Utc::now());
        self.store.put_document(document);

        warn!(
            document = %document_id,
            actor = %actor,
            "emergency posting bypassed approval"
        );
        self.store.record_audit(AuditRecord::new(
            Some(document_id),
            Some(actor),
            AuditAction::EmergencyPosted,
            Some(from_status),
            Some(DocumentStatus::Posted),
            None,
        ));

        self.fan_out(document_id)?;
        Ok(self.build_status(document_id))
    }

    /// Grants a time-boxed delegation on every registration the
    /// approver holds.
    ///
    /// # Errors
    ///
    /// Returns `ApproverNotFound`, or delegation validation errors
    /// (inverted window, self-delegation, overlap). Validation runs
    /// against every registration before any is mutated.
    ///
    /// # Panics
    ///
    /// Panics if the roster lock is poisoned.
    pub fn delegate(
        &self,
        approver: UserId,
        delegate: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut roster = self.roster.write().expect("roster lock poisoned");
        let indices: Vec<usize> = roster
            .iter()
            .enumerate()
            .filter_map(|(i, a)| (a.user == approver).then_some(i))
            .collect();
        if indices.is_empty() {
            return Err(EngineError::ApproverNotFound(approver));
        }

        // Validate against clones of every registration before mutating
        // any, so a late overlap cannot leave the roster half-updated.
        for &i in &indices {
            let mut dry_run = roster[i].clone();
            dry_run
                .add_delegation(Delegation { delegate, from, to })
                .map_err(WorkflowError::from)?;
        }
        for &i in &indices {
            roster[i]
                .add_delegation(Delegation { delegate, from, to })
                .map_err(WorkflowError::from)?;
        }

        info!(approver = %approver, delegate = %delegate, "delegation granted");
        self.store.record_audit(AuditRecord::new(
            None,
            Some(approver),
            AuditAction::DelegationGranted { delegate },
            None,
            None,
            None,
        ));
        Ok(())
    }

    /// Copies the audit trail of a document, in insertion order.
    #[must_use]
    pub fn audit_trail(&self, document_id: DocumentId) -> Vec<AuditRecord> {
        self.store.audit_trail(document_id)
    }

    /// Returns a copy of a stored document.
    #[must_use]
    pub fn document(&self, document_id: DocumentId) -> Option<Document> {
        self.store.document(document_id)
    }

    /// Returns a copy of the derived document posted to one ledger.
    #[must_use]
    pub fn derived_document(
        &self,
        document_id: DocumentId,
        ledger: LedgerId,
    ) -> Option<DerivedDocument> {
        self.store.derived(document_id, ledger)
    }

    /// Fans out an approved document and flips it to Posted.
    ///
    /// With `hold_until_all_ledgers` set, a partial fan-out leaves the
    /// document in Approved for remediation and retry.
    fn post_approved(&self, document_id: DocumentId) -> Result<PostingStatus, EngineError> {
        let status = self.fan_out(document_id)?;

        if status.is_complete() || !self.config.posting.hold_until_all_ledgers {
            self.mark_posted(document_id)?;
            if !status.is_complete() {
                warn!(
                    document = %document_id,
                    succeeded = status.success_count,
                    targeted = status.ledger_count,
                    "document posted with incomplete ledger fan-out"
                );
            }
        } else {
            warn!(
                document = %document_id,
                succeeded = status.success_count,
                targeted = status.ledger_count,
                "document held in approved until all ledgers post"
            );
        }

        Ok(self.build_status(document_id))
    }

    /// Flips an approved document to Posted with its audit record.
    fn mark_posted(&self, document_id: DocumentId) -> Result<(), EngineError> {
        let action = WorkflowService::post(DocumentStatus::Approved)?;
        let now = Utc::now();
        self.store.with_document_mut(document_id, |d| {
            d.status = action.new_status();
            d.posted_at = Some(now);
        });
        self.store.record_audit(AuditRecord::new(
            Some(document_id),
            None,
            AuditAction::Posted,
            Some(DocumentStatus::Approved),
            Some(DocumentStatus::Posted),
            None,
        ));
        Ok(())
    }

    /// Derives and records one posting per non-leading ledger.
    ///
    /// The leading ledger carries the source document itself and is not
    /// part of the fan-out. A failure in one ledger never rolls back
    /// another, and a repeated fan-out leaves successful (document,
    /// ledger) pairs in place.
    fn fan_out(&self, document_id: DocumentId) -> Result<PostingStatus, EngineError> {
        let document = self
            .store
            .document(document_id)
            .ok_or(WorkflowError::DocumentNotFound(document_id))?;
        let snapshot = self.current_snapshot();
        let leading = snapshot.registry.leading().id;

        let targets: Vec<Ledger> = snapshot.registry.non_leading().cloned().collect();
        let snapshot = &snapshot;
        let results: Vec<(Ledger, Result<DerivedDocument, PostingError>)> =
            self.workers.install(|| {
                targets
                    .into_par_iter()
                    .map(|target| {
                        let derived = derive_for_ledger(
                            &document,
                            leading,
                            &target,
                            &snapshot.rules,
                            &snapshot.rates,
                        );
                        (target, derived)
                    })
                    .collect()
            });

        for (target, result) in results {
            match result {
                Ok(derived) => {
                    self.record_attempt(
                        document_id,
                        &target,
                        PostingOutcome::Succeeded {
                            line_count: derived.lines.len(),
                        },
                        Some(derived),
                    );
                }
                Err(err) => {
                    warn!(
                        document = %document_id,
                        ledger = %target.code,
                        code = err.error_code(),
                        "ledger posting failed"
                    );
                    self.record_attempt(
                        document_id,
                        &target,
                        PostingOutcome::Failed {
                            code: err.error_code().to_string(),
                            message: err.to_string(),
                        },
                        None,
                    );
                }
            }
        }

        Ok(self.build_status(document_id))
    }

    /// Records one ledger's posting attempt and its audit record,
    /// unless the pair already has a successful outcome.
    fn record_attempt(
        &self,
        document_id: DocumentId,
        ledger: &Ledger,
        outcome: PostingOutcome,
        derived: Option<DerivedDocument>,
    ) {
        let (stored, inserted) = self.store.record_posting(ParallelPosting {
            id: PostingId::new(),
            document: document_id,
            ledger: ledger.id,
            outcome,
            attempted_at: Utc::now(),
        });
        if !inserted {
            return;
        }

        if let Some(derived) = derived {
            self.store.put_derived(derived);
        }
        let action = match &stored.outcome {
            PostingOutcome::Succeeded { .. } => AuditAction::PostingSucceeded { ledger: ledger.id },
            PostingOutcome::Failed { code, .. } => AuditAction::PostingFailed {
                ledger: ledger.id,
                code: code.clone(),
            },
        };
        let reason = match &stored.outcome {
            PostingOutcome::Succeeded { .. } => None,
            PostingOutcome::Failed { message, .. } => Some(message.clone()),
        };
        self.store
            .record_audit(AuditRecord::new(Some(document_id), None, action, None, None, reason));
    }

    /// Builds the non-leading ledger status report in registry order.
    fn build_status(&self, document_id: DocumentId) -> PostingStatus {
        let snapshot = self.current_snapshot();
        let registry = &snapshot.registry;
        let mut per_ledger = Vec::new();
        let mut success_count = 0;

        for ledger in registry.non_leading() {
            if let Some(posting) = self.store.posting(document_id, ledger.id) {
                if posting.outcome.is_success() {
                    success_count += 1;
                }
                per_ledger.push(LedgerPostingDetail {
                    ledger: ledger.id,
                    ledger_code: ledger.code.clone(),
                    outcome: posting.outcome,
                    attempted_at: posting.attempted_at,
                });
            }
        }

        PostingStatus {
            document: document_id,
            ledger_count: registry.non_leading_count(),
            success_count,
            per_ledger,
        }
    }
}
