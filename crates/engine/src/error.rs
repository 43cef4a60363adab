//! Engine-level error type.

use thiserror::Error;

use paraledger_shared::AppError;
use paraledger_shared::types::UserId;

use paraledger_core::approval::ApprovalError;
use paraledger_core::posting::PostingError;
use paraledger_core::workflow::WorkflowError;

/// Errors returned by the engine's public operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Workflow validation, authorization, or transition failure.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Derivation or posting failure surfaced to the caller.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// The named user holds no approver registration.
    #[error("User {0} holds no approver registration")]
    ApproverNotFound(UserId),

    /// The fan-out worker pool could not be built.
    #[error("Failed to build posting worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    /// Returns the error code for status reporting.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Workflow(e) => e.error_code(),
            Self::Posting(e) => e.error_code(),
            Self::ApproverNotFound(_) => "APPROVER_NOT_FOUND",
            Self::WorkerPool(_) => "WORKER_POOL_INIT_FAILED",
        }
    }

    /// Whether the caller can safely retry after refreshing state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Workflow(e) if e.is_retryable())
    }
}

/// Coarse-grained mapping for callers that only care about the error
/// category, not the specific variant.
impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match &err {
            EngineError::Workflow(e) => match e {
                WorkflowError::Validation(_) | WorkflowError::RejectionReasonRequired => {
                    Self::Validation(message)
                }
                WorkflowError::Approval(a) => match a {
                    ApprovalError::DelegationWindowInverted
                    | ApprovalError::OverlappingDelegation { .. }
                    | ApprovalError::SelfDelegation(_) => Self::BusinessRule(message),
                    _ => Self::Configuration(message),
                },
                WorkflowError::NoEligibleApprover { .. } => Self::Configuration(message),
                WorkflowError::NotEligible { .. }
                | WorkflowError::SelfApproval { .. }
                | WorkflowError::MissingOverridePermission { .. } => Self::Forbidden(message),
                WorkflowError::AlreadyDecided | WorkflowError::AlreadySubmitted(_) => {
                    Self::Conflict(message)
                }
                WorkflowError::DocumentNotFound(_) | WorkflowError::InstanceNotFound(_) => {
                    Self::NotFound(message)
                }
                WorkflowError::InvalidTransition { .. } => Self::BusinessRule(message),
            },
            EngineError::Posting(e) => match e {
                PostingError::NoDerivationRule { .. }
                | PostingError::AmbiguousRule { .. }
                | PostingError::Rate(_) => Self::Configuration(message),
                _ => Self::BusinessRule(message),
            },
            EngineError::ApproverNotFound(_) => Self::NotFound(message),
            EngineError::WorkerPool(_) => Self::Internal(message),
        }
    }
}
