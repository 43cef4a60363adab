//! Document lifecycle state machine.
//!
//! # Modules
//!
//! - `types` - Workflow instance, decisions, and actions
//! - `error` - Workflow-specific error types
//! - `service` - State transition and authorization logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{Decision, DecisionOutcome, WorkflowAction, WorkflowInstance};
