//! Parallel-ledger posting: derivation rules, currency translation,
//! and per-ledger outcomes.
//!
//! # Modules
//!
//! - `rules` - Derivation rule configuration and resolution
//! - `derive` - Per-ledger derivation of a source document
//! - `types` - Derived documents and posting status reporting
//! - `error` - Posting-specific error types

pub mod derive;
pub mod error;
pub mod rules;
pub mod types;

#[cfg(test)]
mod derive_props;

pub use derive::derive_for_ledger;
pub use error::PostingError;
pub use rules::{DerivationRule, RuleKind, RuleTable};
pub use types::{
    DerivedDocument, DerivedLine, LedgerPostingDetail, ParallelPosting, PostingOutcome,
    PostingStatus,
};
