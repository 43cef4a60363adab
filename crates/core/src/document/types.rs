//! Document domain types for the posting lifecycle.
//!
//! A document is the unit of work flowing through approval and posting.
//! It is owned by the workflow engine from submission until it is
//! posted, after which it is permanently read-only (corrections require
//! a reversing document, never a mutation).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use paraledger_shared::types::{AccountId, CompanyId, DocumentId, LedgerId, UserId};
use paraledger_shared::types::Currency;

/// Document status in the approval workflow.
///
/// The valid transitions are:
/// - Draft → PendingApproval (submit)
/// - PendingApproval → Approved (approve)
/// - PendingApproval → Rejected (reject), then Rejected → Draft (revise)
/// - Approved → Posted (post)
/// - Draft → Posted (emergency override only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Document is being drafted and can be modified.
    Draft,
    /// Document has been submitted and awaits a decision.
    PendingApproval,
    /// Document has been approved and is ready for posting.
    Approved,
    /// Document has been rejected and returns to draft for revision.
    Rejected,
    /// Document has been posted to the ledgers (immutable).
    Posted,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Posted => "posted",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "posted" => Some(Self::Posted),
            _ => None,
        }
    }

    /// Returns true if the document can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    /// Returns true if the document is permanently read-only.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Debit or credit side of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Unique business key of a document: (company, fiscal year, number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// The company the document belongs to.
    pub company: CompanyId,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Document number, unique within (company, fiscal year).
    pub number: u32,
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.company, self.fiscal_year, self.number)
    }
}

/// A single line of a document.
///
/// The amount is always non-negative; the side determines whether it is
/// a debit or a credit. Lines default to the leading ledger when no
/// ledger is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLine {
    /// Line number, unique within the document.
    pub line_no: u32,
    /// The account this line posts to.
    pub account: AccountId,
    /// Debit or credit.
    pub side: Side,
    /// Non-negative amount in the line currency.
    pub amount: Decimal,
    /// Target ledger; `None` means the leading ledger.
    pub ledger: Option<LedgerId>,
    /// Currency of the amount.
    pub currency: Currency,
    /// Optional cost attribution dimension.
    pub cost_center: Option<String>,
    /// Optional profit attribution dimension.
    pub profit_center: Option<String>,
    /// Optional line memo.
    pub memo: Option<String>,
}

impl DocumentLine {
    /// The debit portion of this line (zero for credit lines).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => Decimal::ZERO,
        }
    }

    /// The credit portion of this line (zero for debit lines).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        match self.side {
            Side::Debit => Decimal::ZERO,
            Side::Credit => self.amount,
        }
    }
}

/// An accounting document: header plus lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Surrogate identifier.
    pub id: DocumentId,
    /// Business key (company, fiscal year, number).
    pub key: DocumentKey,
    /// Document header currency.
    pub currency: Currency,
    /// Posting date; drives exchange rate resolution.
    pub posting_date: NaiveDate,
    /// Header description.
    pub description: String,
    /// The document lines (at least two for a balanced document).
    pub lines: Vec<DocumentLine>,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Who submitted the document (set at submission).
    pub submitter: Option<UserId>,
    /// When the document was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the document was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the document was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
    /// When the document was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Link to the document this one reverses, if any.
    pub reversal_of: Option<DocumentId>,
}

impl Document {
    /// Creates a new draft document.
    #[must_use]
    pub fn draft(
        key: DocumentKey,
        currency: Currency,
        posting_date: NaiveDate,
        description: String,
        lines: Vec<DocumentLine>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            key,
            currency,
            posting_date,
            description,
            lines,
            status: DocumentStatus::Draft,
            submitter: None,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            posted_at: None,
            reversal_of: None,
        }
    }

    /// Sum of all debit lines.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(DocumentLine::debit).sum()
    }

    /// Sum of all credit lines.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(DocumentLine::credit).sum()
    }

    /// The absolute amount used for approval level routing.
    ///
    /// For a balanced document this equals both the debit and the
    /// credit total.
    #[must_use]
    pub fn routing_amount(&self) -> Decimal {
        self.total_debit()
    }
}
