//! Double-entry validation for documents.
//!
//! Drafts arrive from an external collaborator that claims to have
//! validated them; the engine re-verifies defensively before anything
//! enters the workflow.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{Document, DocumentLine, Side};

/// Validation errors for document balance rules.
#[derive(Debug, Error)]
pub enum DocumentValidationError {
    /// Document has no lines.
    #[error("Document must have at least one line")]
    NoLines,

    /// Document has fewer than two lines.
    #[error("Document must have at least two lines with offsetting sides")]
    InsufficientLines,

    /// Document has only one side (all debits or all credits).
    #[error("Document must have both debit and credit lines")]
    SingleSided,

    /// Line amount is zero.
    #[error("Line {line_no} has a zero amount")]
    ZeroAmount {
        /// The offending line number.
        line_no: u32,
    },

    /// Line amount is negative.
    #[error("Line {line_no} has a negative amount")]
    NegativeAmount {
        /// The offending line number.
        line_no: u32,
    },

    /// Duplicate line number within the document.
    #[error("Line number {line_no} appears more than once")]
    DuplicateLineNumber {
        /// The duplicated line number.
        line_no: u32,
    },

    /// Debits and credits do not balance.
    #[error("Document is unbalanced: debits ({debits}) != credits ({credits})")]
    Unbalanced {
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },
}

/// Validates that a document satisfies double-entry rules.
///
/// A valid document has at least two lines, every amount strictly
/// positive, both sides represented, unique line numbers, and equal
/// debit and credit totals greater than zero.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_document(document: &Document) -> Result<(), DocumentValidationError> {
    validate_lines(&document.lines)
}

/// Validates a line set independently of the header.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_lines(lines: &[DocumentLine]) -> Result<(), DocumentValidationError> {
    if lines.is_empty() {
        return Err(DocumentValidationError::NoLines);
    }
    if lines.len() < 2 {
        return Err(DocumentValidationError::InsufficientLines);
    }

    let mut total_debits = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;
    let mut has_debit = false;
    let mut has_credit = false;
    let mut seen = std::collections::HashSet::new();

    for line in lines {
        if !seen.insert(line.line_no) {
            return Err(DocumentValidationError::DuplicateLineNumber {
                line_no: line.line_no,
            });
        }
        if line.amount.is_zero() {
            return Err(DocumentValidationError::ZeroAmount {
                line_no: line.line_no,
            });
        }
        if line.amount.is_sign_negative() {
            return Err(DocumentValidationError::NegativeAmount {
                line_no: line.line_no,
            });
        }

        match line.side {
            Side::Debit => {
                total_debits += line.amount;
                has_debit = true;
            }
            Side::Credit => {
                total_credits += line.amount;
                has_credit = true;
            }
        }
    }

    if !has_debit || !has_credit {
        return Err(DocumentValidationError::SingleSided);
    }

    if total_debits != total_credits {
        return Err(DocumentValidationError::Unbalanced {
            debits: total_debits,
            credits: total_credits,
        });
    }

    Ok(())
}
