//! Workflow error types for the document lifecycle.

use thiserror::Error;

use paraledger_shared::types::{CompanyId, DocumentId, UserId, WorkflowInstanceId};

use crate::approval::ApprovalError;
use crate::document::{DocumentStatus, DocumentValidationError};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: DocumentStatus,
        /// The attempted target status.
        to: DocumentStatus,
    },

    /// Document failed double-entry validation.
    #[error(transparent)]
    Validation(#[from] DocumentValidationError),

    /// Approval policy or delegation error.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// The approver pool resolved empty at submission.
    #[error("No eligible approver for company {company} at level {level_order}")]
    NoEligibleApprover {
        /// The document's company.
        company: CompanyId,
        /// The required approval level.
        level_order: u8,
    },

    /// The actor is not in the instance's eligible pool.
    #[error("User {actor} is not eligible to decide this workflow instance")]
    NotEligible {
        /// The rejected actor.
        actor: UserId,
    },

    /// Segregation of duties: submitter cannot decide their own
    /// document. The action is rejected; the document stays pending.
    #[error("User {actor} submitted this document and cannot approve it")]
    SelfApproval {
        /// The rejected actor.
        actor: UserId,
    },

    /// The document already has an open workflow instance; a second
    /// submission would break the one-instance-per-document invariant.
    #[error("Document {0} is already pending approval")]
    AlreadySubmitted(DocumentId),

    /// A concurrent decision won; safe to refresh and retry reads.
    #[error("Workflow instance has already been decided")]
    AlreadyDecided,

    /// Rejection requires a reason.
    #[error("Rejection comments are required")]
    RejectionReasonRequired,

    /// Emergency posting requires a distinguished permission.
    #[error("User {actor} lacks the emergency posting permission")]
    MissingOverridePermission {
        /// The rejected actor.
        actor: UserId,
    },

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),

    /// Workflow instance not found.
    #[error("Workflow instance {0} not found")]
    InstanceNotFound(WorkflowInstanceId),
}

impl WorkflowError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Approval(_) => "APPROVAL_CONFIGURATION_ERROR",
            Self::NoEligibleApprover { .. } => "NO_ELIGIBLE_APPROVER",
            Self::NotEligible { .. } => "NOT_ELIGIBLE",
            Self::SelfApproval { .. } => "SELF_APPROVAL_VIOLATION",
            Self::AlreadySubmitted(_) => "ALREADY_SUBMITTED",
            Self::AlreadyDecided => "ALREADY_DECIDED",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::MissingOverridePermission { .. } => "MISSING_OVERRIDE_PERMISSION",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::InstanceNotFound(_) => "INSTANCE_NOT_FOUND",
        }
    }

    /// Whether the caller can safely retry after refreshing state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AlreadyDecided)
    }
}
