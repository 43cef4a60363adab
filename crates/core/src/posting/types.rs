//! Derived documents and per-ledger posting outcomes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paraledger_shared::types::{AccountId, Currency, DocumentId, LedgerId, PostingId};

use crate::document::Side;

/// A line of a derived document, expressed in the target ledger's base
/// currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedLine {
    /// Line number, carried from the source line.
    pub line_no: u32,
    /// Target account after any rule remapping.
    pub account: AccountId,
    /// Debit or credit, carried from the source line.
    pub side: Side,
    /// Translated and adjusted amount.
    pub amount: Decimal,
    /// Cost attribution dimension, carried over.
    pub cost_center: Option<String>,
    /// Profit attribution dimension, carried over.
    pub profit_center: Option<String>,
}

impl DerivedLine {
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

/// A document derived into one parallel ledger.
///
/// Guaranteed balanced in the target currency when produced by the
/// derivation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedDocument {
    /// The source document.
    pub source: DocumentId,
    /// The target ledger.
    pub ledger: LedgerId,
    /// The target ledger's base currency.
    pub currency: Currency,
    /// Posting date, carried from the source document.
    pub posting_date: NaiveDate,
    /// The derived lines, in source line order.
    pub lines: Vec<DerivedLine>,
}

impl DerivedDocument {
    /// Sum of all debit lines.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(DerivedLine::debit).sum()
    }

    /// Sum of all credit lines.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(DerivedLine::credit).sum()
    }

    /// Whether debits equal credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}

/// Outcome of a single ledger's posting attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PostingOutcome {
    /// The derived document was written to the ledger.
    Succeeded {
        /// Number of derived lines written.
        line_count: usize,
    },
    /// Derivation or posting failed; nothing was written to this ledger.
    Failed {
        /// Stable error code.
        code: String,
        /// Human-readable failure detail.
        message: String,
    },
}

impl PostingOutcome {
    /// Whether the attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// A recorded posting attempt for one (document, ledger) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelPosting {
    /// Unique identifier.
    pub id: PostingId,
    /// The source document.
    pub document: DocumentId,
    /// The target ledger.
    pub ledger: LedgerId,
    /// Success or failure.
    pub outcome: PostingOutcome,
    /// When the attempt was made.
    pub attempted_at: DateTime<Utc>,
}

/// Per-ledger detail in a posting status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPostingDetail {
    /// The target ledger.
    pub ledger: LedgerId,
    /// The ledger's short code, for display.
    pub ledger_code: String,
    /// Success or failure of this ledger's attempt.
    pub outcome: PostingOutcome,
    /// When the attempt was made.
    pub attempted_at: DateTime<Utc>,
}

/// Aggregate posting status of a document across the non-leading
/// ledgers. The leading ledger carries the source document itself and
/// has no fan-out attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingStatus {
    /// The document.
    pub document: DocumentId,
    /// Number of non-leading ledgers targeted by the fan-out.
    pub ledger_count: usize,
    /// Number of ledgers that succeeded.
    pub success_count: usize,
    /// Per-ledger attempt details, in registry order.
    pub per_ledger: Vec<LedgerPostingDetail>,
}

impl PostingStatus {
    /// Whether every targeted ledger succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.success_count == self.ledger_count
    }

    /// Whether some but not all ledgers succeeded.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && !self.is_complete()
    }

    /// The ledgers still needing remediation.
    pub fn failed_ledgers(&self) -> impl Iterator<Item = &LedgerPostingDetail> {
        self.per_ledger.iter().filter(|d| !d.outcome.is_success())
    }
}
