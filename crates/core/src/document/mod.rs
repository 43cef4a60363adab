//! Accounting documents and double-entry validation.
//!
//! # Modules
//!
//! - `types` - Document, lines, status, and business key
//! - `validation` - Balance and line validation rules
//! - `reversal` - Reversing-document creation for posted documents

pub mod reversal;
pub mod types;
pub mod validation;

pub use reversal::{build_reversing_document, ReversalError};
pub use types::{Document, DocumentKey, DocumentLine, DocumentStatus, Side};
pub use validation::{validate_document, validate_lines, DocumentValidationError};
