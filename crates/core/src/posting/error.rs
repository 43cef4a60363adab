//! Posting and derivation error types.

use rust_decimal::Decimal;
use thiserror::Error;

use paraledger_shared::types::{AccountId, LedgerId};

use crate::currency::RateError;
use crate::document::DocumentStatus;

/// Errors that can occur while deriving or posting a document.
#[derive(Debug, Error)]
pub enum PostingError {
    /// No active derivation rule matched the line's account for the
    /// target ledger.
    #[error("No derivation rule for account {account} into ledger {target_ledger}")]
    NoDerivationRule {
        /// The source line's account.
        account: AccountId,
        /// The ledger being derived into.
        target_ledger: LedgerId,
    },

    /// More than one rule matched at the same specificity.
    #[error("Ambiguous derivation rules for account {account} into ledger {target_ledger}")]
    AmbiguousRule {
        /// The source line's account.
        account: AccountId,
        /// The ledger being derived into.
        target_ledger: LedgerId,
    },

    /// Exchange rate resolution failed.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// The derived document does not balance after residual absorption.
    #[error("Derived document for ledger {ledger} unbalanced: debits {debits}, credits {credits}")]
    UnbalancedDerived {
        /// The target ledger.
        ledger: LedgerId,
        /// Total derived debits.
        debits: Decimal,
        /// Total derived credits.
        credits: Decimal,
    },

    /// The rounding residual exceeds the acceptable bound of one minor
    /// unit per line; the amounts are wrong, not merely rounded.
    #[error("Rounding residual {residual} for ledger {ledger} exceeds bound {bound}")]
    ResidualTooLarge {
        /// The target ledger.
        ledger: LedgerId,
        /// The observed absolute residual.
        residual: Decimal,
        /// The maximum tolerated residual.
        bound: Decimal,
    },

    /// Posting requires an approved document.
    #[error("Cannot post a document in status {0}")]
    NotApproved(DocumentStatus),

    /// Residual absorption would drive the final line negative.
    #[error("Residual absorption would make line {line_no} negative in ledger {ledger}")]
    AbsorptionUnderflow {
        /// The target ledger.
        ledger: LedgerId,
        /// The absorbing line.
        line_no: u32,
    },
}

impl PostingError {
    /// Returns the error code for status reporting.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoDerivationRule { .. } => "NO_DERIVATION_RULE",
            Self::AmbiguousRule { .. } => "AMBIGUOUS_DERIVATION_RULE",
            Self::Rate(RateError::RateNotFound { .. }) => "RATE_NOT_FOUND",
            Self::Rate(RateError::NonPositiveRate { .. }) => "NON_POSITIVE_RATE",
            Self::UnbalancedDerived { .. } => "UNBALANCED_DERIVED_DOCUMENT",
            Self::ResidualTooLarge { .. } => "RESIDUAL_TOO_LARGE",
            Self::NotApproved(_) => "DOCUMENT_NOT_APPROVED",
            Self::AbsorptionUnderflow { .. } => "RESIDUAL_ABSORPTION_UNDERFLOW",
        }
    }
}
