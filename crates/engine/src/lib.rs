//! Approval-gated posting engine for Paraledger.
//!
//! Orchestrates the document lifecycle on top of `paraledger-core`:
//! submission routes to an approval level, decisions serialize per
//! instance, and approvals fan out derived documents to every
//! configured parallel ledger.
//!
//! # Modules
//!
//! - `service` - The engine and its public operations
//! - `store` - Concurrent in-memory state
//! - `error` - Engine-level error type

pub mod error;
pub mod service;
pub mod store;

pub use error::EngineError;
pub use service::{DecisionSummary, Engine};
pub use store::EngineStore;
