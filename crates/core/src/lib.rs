//! Core business logic for Paraledger.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `document` - Accounting documents and double-entry validation
//! - `registry` - Ledger registry (leading and parallel books)
//! - `currency` - Exchange rates and currency translation
//! - `approval` - Approval policy, levels, and delegation
//! - `workflow` - Document lifecycle state machine
//! - `posting` - Derivation rules and parallel-ledger fan-out
//! - `audit` - Append-only audit trail types
//! - `snapshot` - Immutable configuration snapshot

pub mod approval;
pub mod audit;
pub mod currency;
pub mod document;
pub mod posting;
pub mod registry;
pub mod snapshot;
pub mod workflow;
