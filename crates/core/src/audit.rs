//! Append-only audit trail.
//!
//! Every state transition and posting attempt writes exactly one
//! record. The log exposes no removal or mutation API; corrections are
//! new records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use paraledger_shared::types::{AuditRecordId, DocumentId, LedgerId, UserId};

use crate::document::DocumentStatus;

/// What happened, for audit classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum AuditAction {
    /// Document submitted for approval.
    Submitted,
    /// Document approved.
    Approved,
    /// Document rejected.
    Rejected,
    /// Rejected document returned to draft.
    Reopened,
    /// Document posted to the leading ledger.
    Posted,
    /// Document posted via the emergency override.
    EmergencyPosted,
    /// A parallel ledger accepted its derived document.
    PostingSucceeded {
        /// The target ledger.
        ledger: LedgerId,
    },
    /// A parallel ledger's derivation or posting failed.
    PostingFailed {
        /// The target ledger.
        ledger: LedgerId,
        /// Stable error code of the failure.
        code: String,
    },
    /// An approver delegated their authority for a window.
    DelegationGranted {
        /// The receiving user.
        delegate: UserId,
    },
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Reopened => write!(f, "reopened"),
            Self::Posted => write!(f, "posted"),
            Self::EmergencyPosted => write!(f, "emergency_posted"),
            Self::PostingSucceeded { ledger } => write!(f, "posting_succeeded:{ledger}"),
            Self::PostingFailed { ledger, code } => {
                write!(f, "posting_failed:{ledger}:{code}")
            }
            Self::DelegationGranted { delegate } => write!(f, "delegation_granted:{delegate}"),
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier.
    pub id: AuditRecordId,
    /// The document the record concerns; `None` for configuration
    /// actions such as delegation grants.
    pub document: Option<DocumentId>,
    /// The acting user; `None` for system-driven actions.
    pub actor: Option<UserId>,
    /// Action classification.
    pub action: AuditAction,
    /// Document status before the action, when it changed.
    pub from_status: Option<DocumentStatus>,
    /// Document status after the action, when it changed.
    pub to_status: Option<DocumentStatus>,
    /// Free-text detail: rejection reason, failure message.
    pub reason: Option<String>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        document: Option<DocumentId>,
        actor: Option<UserId>,
        action: AuditAction,
        from_status: Option<DocumentStatus>,
        to_status: Option<DocumentStatus>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: AuditRecordId::new(),
            document,
            actor,
            action,
            from_status,
            to_status,
            reason,
            recorded_at: Utc::now(),
        }
    }
}

/// The append-only audit log.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(&mut self, record: AuditRecord) {
        self.records.push(record);
    }

    /// All records for one document, in insertion order.
    #[must_use]
    pub fn for_document(&self, document: DocumentId) -> Vec<&AuditRecord> {
        self.records
            .iter()
            .filter(|r| r.document == Some(document))
            .collect()
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter()
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
