//! Workflow domain types for the document lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use paraledger_shared::types::{CompanyId, DocumentId, UserId, WorkflowInstanceId};

use crate::document::DocumentStatus;

/// Outcome of an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    /// Document approved; posting follows.
    Approved,
    /// Document rejected back to draft.
    Rejected,
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A recorded decision on a workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The deciding user.
    pub actor: UserId,
    /// Approve or reject.
    pub outcome: DecisionOutcome,
    /// Decision comments (mandatory for rejections).
    pub comments: Option<String>,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

/// A workflow instance, created 1:1 with a submitted document.
///
/// The required level and eligible pool are snapshots taken at
/// submission time; later configuration changes never alter an
/// in-flight instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Unique identifier.
    pub id: WorkflowInstanceId,
    /// The submitted document.
    pub document_id: DocumentId,
    /// The document's company.
    pub company: CompanyId,
    /// Required approval level order, resolved at submission.
    pub required_level_order: u8,
    /// Required approval level name, for display.
    pub required_level_name: String,
    /// Eligible approver pool, resolved at submission.
    pub eligible_approvers: Vec<UserId>,
    /// Who submitted the document.
    pub submitter: UserId,
    /// When the document was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Optional decision deadline for overdue flagging.
    pub deadline: Option<DateTime<Utc>>,
    /// The terminal decision, once made.
    pub decision: Option<Decision>,
}

impl WorkflowInstance {
    /// Whether the instance still awaits a decision.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.decision.is_none()
    }

    /// Time elapsed since submission, for escalation reporting.
    #[must_use]
    pub fn elapsed_since_submission(&self, now: DateTime<Utc>) -> Duration {
        now - self.submitted_at
    }

    /// Whether the instance is open past its deadline.
    ///
    /// The state machine never auto-transitions on timeout; external
    /// schedulers poll this flag.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.deadline.is_some_and(|d| now > d)
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft document for approval.
    Submit {
        /// The new status after submission.
        new_status: DocumentStatus,
        /// The submitting user.
        submitted_by: UserId,
        /// When the document was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a pending document.
    Approve {
        /// The new status after approval.
        new_status: DocumentStatus,
        /// The approving user.
        approved_by: UserId,
        /// When the document was approved.
        approved_at: DateTime<Utc>,
        /// Optional approver comments.
        comments: Option<String>,
    },
    /// Reject a pending document back to draft.
    Reject {
        /// The new status after rejection.
        new_status: DocumentStatus,
        /// The rejecting user.
        rejected_by: UserId,
        /// When the document was rejected.
        rejected_at: DateTime<Utc>,
        /// The mandatory rejection reason.
        reason: String,
    },
    /// Post an approved document to the ledgers.
    Post {
        /// The new status after posting.
        new_status: DocumentStatus,
        /// When the document was posted.
        posted_at: DateTime<Utc>,
    },
    /// Return a rejected document to draft for revision.
    Reopen {
        /// The new status after reopening (Draft).
        new_status: DocumentStatus,
        /// When the document was reopened.
        reopened_at: DateTime<Utc>,
    },
    /// Post a draft directly, bypassing approval (emergency override).
    EmergencyPost {
        /// The new status after posting.
        new_status: DocumentStatus,
        /// The overriding user.
        posted_by: UserId,
        /// When the document was posted.
        posted_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> DocumentStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Post { new_status, .. }
            | Self::Reopen { new_status, .. }
            | Self::EmergencyPost { new_status, .. } => *new_status,
        }
    }
}
