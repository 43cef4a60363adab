//! State transitions for the document lifecycle.
//!
//! All methods are associated functions that validate and execute
//! state transitions, returning a `WorkflowAction` carrying audit
//! trail information. Persistence and locking live in the engine
//! crate; this service is pure.

use chrono::Utc;

use paraledger_shared::types::UserId;

use crate::document::DocumentStatus;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{WorkflowAction, WorkflowInstance};

/// Stateless service for document workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft document for approval.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the document is not in Draft (a rejected
    /// document returns to Draft before resubmission).
    pub fn submit(
        current_status: DocumentStatus,
        submitted_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Draft => Ok(WorkflowAction::Submit {
                new_status: DocumentStatus::PendingApproval,
                submitted_by,
                submitted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::PendingApproval,
            }),
        }
    }

    /// Approve a pending document.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the document is not pending approval.
    pub fn approve(
        current_status: DocumentStatus,
        approved_by: UserId,
        comments: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::PendingApproval => Ok(WorkflowAction::Approve {
                new_status: DocumentStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                comments,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Approved,
            }),
        }
    }

    /// Reject a pending document back to draft.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if not pending; `RejectionReasonRequired`
    /// if the reason is blank.
    pub fn reject(
        current_status: DocumentStatus,
        rejected_by: UserId,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        match current_status {
            DocumentStatus::PendingApproval => Ok(WorkflowAction::Reject {
                new_status: DocumentStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                reason,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Rejected,
            }),
        }
    }

    /// Post an approved document to the ledgers.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the document is not approved.
    pub fn post(current_status: DocumentStatus) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Approved => Ok(WorkflowAction::Post {
                new_status: DocumentStatus::Posted,
                posted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Posted,
            }),
        }
    }

    /// Post a draft directly, bypassing approval.
    ///
    /// Restricted to callers holding the emergency-posting permission;
    /// still invokes the posting fan-out and writes an override-flagged
    /// audit record.
    ///
    /// # Errors
    ///
    /// `MissingOverridePermission` without the permission flag;
    /// `InvalidTransition` if the document is not in Draft.
    pub fn emergency_post(
        current_status: DocumentStatus,
        posted_by: UserId,
        has_override_permission: bool,
    ) -> Result<WorkflowAction, WorkflowError> {
        if !has_override_permission {
            return Err(WorkflowError::MissingOverridePermission { actor: posted_by });
        }

        match current_status {
            DocumentStatus::Draft => Ok(WorkflowAction::EmergencyPost {
                new_status: DocumentStatus::Posted,
                posted_by,
                posted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Posted,
            }),
        }
    }

    /// Return a rejected document to draft for revision.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the document is not rejected.
    pub fn reopen(current_status: DocumentStatus) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Rejected => Ok(WorkflowAction::Reopen {
                new_status: DocumentStatus::Draft,
                reopened_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Draft,
            }),
        }
    }

    /// Authorizes an actor to decide an open instance.
    ///
    /// Checks, in order: the instance is still open, the actor is in
    /// the eligible pool, and segregation of duties (actor is not the
    /// submitter). A violation rejects the action, never the document.
    ///
    /// # Errors
    ///
    /// `AlreadyDecided`, `NotEligible`, or `SelfApproval`.
    pub fn authorize_decision(
        instance: &WorkflowInstance,
        actor: UserId,
    ) -> Result<(), WorkflowError> {
        if !instance.is_open() {
            return Err(WorkflowError::AlreadyDecided);
        }
        if !instance.eligible_approvers.contains(&actor) {
            return Err(WorkflowError::NotEligible { actor });
        }
        if actor == instance.submitter {
            return Err(WorkflowError::SelfApproval { actor });
        }
        Ok(())
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → PendingApproval (submit)
    /// - PendingApproval → Approved (approve)
    /// - PendingApproval → Rejected (reject)
    /// - Rejected → Draft (revise)
    /// - Approved → Posted (post)
    /// - Draft → Posted (emergency override)
    #[must_use]
    pub fn is_valid_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
        matches!(
            (from, to),
            (
                DocumentStatus::Draft,
                DocumentStatus::PendingApproval | DocumentStatus::Posted
            ) | (
                DocumentStatus::PendingApproval,
                DocumentStatus::Approved | DocumentStatus::Rejected
            ) | (DocumentStatus::Rejected, DocumentStatus::Draft)
                | (DocumentStatus::Approved, DocumentStatus::Posted)
        )
    }
}
