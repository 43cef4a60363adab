//! Approval policy and delegation error types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use paraledger_shared::types::{CompanyId, UserId};

/// Errors raised by approval policy resolution and delegation.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Amount is negative or otherwise not routable.
    #[error("Invalid routing amount: {0}")]
    InvalidAmount(Decimal),

    /// No level range covers the amount. The policy is misconfigured;
    /// this requires administrator action, not resubmission.
    #[error("No approval level for company {company} covers amount {amount}")]
    NoLevelForAmount {
        /// The company whose policy was consulted.
        company: CompanyId,
        /// The uncovered amount.
        amount: Decimal,
    },

    /// The company has no configured levels at all.
    #[error("No approval policy configured for company {0}")]
    UnknownCompany(CompanyId),

    /// Level ranges for a company leave a gap or overlap.
    #[error("Approval levels for company {company} are not contiguous at order {order}")]
    NonContiguousLevels {
        /// The company with the broken policy.
        company: CompanyId,
        /// The level order where the gap/overlap starts.
        order: u8,
    },

    /// The lowest level must start at zero.
    #[error("First approval level for company {company} must start at zero")]
    FirstLevelNotZero {
        /// The company with the broken policy.
        company: CompanyId,
    },

    /// Only the highest level may be unbounded.
    #[error("Unbounded approval level for company {company} must be the last")]
    UnboundedLevelNotLast {
        /// The company with the broken policy.
        company: CompanyId,
    },

    /// A level's range is empty or inverted.
    #[error("Approval level order {order} for company {company} has an empty range")]
    EmptyLevelRange {
        /// The company with the broken policy.
        company: CompanyId,
        /// The offending level order.
        order: u8,
    },

    /// Delegation window end precedes its start.
    #[error("Delegation window ends before it starts")]
    DelegationWindowInverted,

    /// A new delegation overlaps an existing one for the same approver.
    #[error("Approver {approver} already has a delegation overlapping {from}..{to}")]
    OverlappingDelegation {
        /// The delegating approver.
        approver: UserId,
        /// Start of the rejected window.
        from: DateTime<Utc>,
        /// End of the rejected window.
        to: DateTime<Utc>,
    },

    /// Self-delegation is meaningless and rejected.
    #[error("Approver {0} cannot delegate to themselves")]
    SelfDelegation(UserId),
}
