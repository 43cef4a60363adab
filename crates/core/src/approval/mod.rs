//! Approval policy, levels, and delegation.
//!
//! # Modules
//!
//! - `policy` - Approval levels and amount-based routing
//! - `approver` - Approver registrations, delegation, eligible pools
//! - `error` - Approval-specific error types

pub mod approver;
pub mod error;
pub mod policy;

#[cfg(test)]
mod policy_props;

pub use approver::{eligible_pool, Approver, Delegation};
pub use error::ApprovalError;
pub use policy::{ApprovalLevel, ApprovalPolicy};
