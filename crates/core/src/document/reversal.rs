//! Reversing-document creation.
//!
//! Posted documents are immutable; corrections are made by posting a
//! new document with debits and credits swapped, linked back to the
//! original.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::{Document, DocumentKey, DocumentStatus};

/// Errors raised when building a reversing document.
#[derive(Debug, Error)]
pub enum ReversalError {
    /// Only posted documents can be reversed.
    #[error("Cannot reverse a document in status {0}")]
    NotPosted(DocumentStatus),

    /// A reversal reason is required.
    #[error("Reversal reason is required")]
    ReasonRequired,
}

/// Builds a draft reversing document for a posted original.
///
/// Each line keeps its account, amount, and dimensions but swaps side;
/// memos are prefixed so the reversal is visible line by line. The new
/// document starts in Draft and goes through the normal approval
/// workflow.
///
/// # Errors
///
/// Returns an error if the original is not posted or the reason is
/// blank.
pub fn build_reversing_document(
    original: &Document,
    new_key: DocumentKey,
    posting_date: NaiveDate,
    reason: &str,
) -> Result<Document, ReversalError> {
    if original.status != DocumentStatus::Posted {
        return Err(ReversalError::NotPosted(original.status));
    }
    if reason.trim().is_empty() {
        return Err(ReversalError::ReasonRequired);
    }

    let lines = original
        .lines
        .iter()
        .map(|line| {
            let mut reversed = line.clone();
            reversed.side = line.side.opposite();
            reversed.memo = Some(format!(
                "Reversal: {}",
                line.memo.clone().unwrap_or_default()
            ));
            reversed
        })
        .collect();

    let mut document = Document::draft(
        new_key,
        original.currency,
        posting_date,
        format!("Reversal of {}. Reason: {reason}", original.key),
        lines,
    );
    document.reversal_of = Some(original.id);

    Ok(document)
}
