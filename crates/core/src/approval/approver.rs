//! Approvers, delegation windows, and eligible-pool computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paraledger_shared::types::{CompanyId, UserId};

use super::error::ApprovalError;

/// A time-boxed delegation of approval authority.
///
/// While the window covers "now", the delegate is eligible *in place
/// of* the approver, not in addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    /// The user receiving authority.
    pub delegate: UserId,
    /// Window start, inclusive.
    pub from: DateTime<Utc>,
    /// Window end, inclusive.
    pub to: DateTime<Utc>,
}

impl Delegation {
    /// Whether the window covers the given instant.
    #[must_use]
    pub fn covers(&self, now: DateTime<Utc>) -> bool {
        self.from <= now && now <= self.to
    }

    /// Whether two windows overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

/// An approver registration: a user holding an approval level for a
/// company. A user may hold multiple levels and companies through
/// multiple registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approver {
    /// The approving user.
    pub user: UserId,
    /// The company scope.
    pub company: CompanyId,
    /// The approval level order held.
    pub level_order: u8,
    /// Inactive approvers are excluded from pools.
    pub active: bool,
    /// Time-boxed delegations, non-overlapping.
    pub delegations: Vec<Delegation>,
}

impl Approver {
    /// Creates an active approver with no delegations.
    #[must_use]
    pub fn new(user: UserId, company: CompanyId, level_order: u8) -> Self {
        Self {
            user,
            company,
            level_order,
            active: true,
            delegations: Vec::new(),
        }
    }

    /// Adds a delegation after validating the window.
    ///
    /// # Errors
    ///
    /// Rejects inverted windows, self-delegation, and windows
    /// overlapping an existing delegation for this approver.
    pub fn add_delegation(&mut self, delegation: Delegation) -> Result<(), ApprovalError> {
        if delegation.to < delegation.from {
            return Err(ApprovalError::DelegationWindowInverted);
        }
        if delegation.delegate == self.user {
            return Err(ApprovalError::SelfDelegation(self.user));
        }
        if self.delegations.iter().any(|d| d.overlaps(&delegation)) {
            return Err(ApprovalError::OverlappingDelegation {
                approver: self.user,
                from: delegation.from,
                to: delegation.to,
            });
        }
        self.delegations.push(delegation);
        Ok(())
    }

    /// The user currently holding this approver's authority: the
    /// delegate while a delegation window covers `now`, otherwise the
    /// approver themselves.
    #[must_use]
    pub fn effective_user(&self, now: DateTime<Utc>) -> UserId {
        self.delegations
            .iter()
            .find(|d| d.covers(now))
            .map_or(self.user, |d| d.delegate)
    }
}

/// Computes the eligible approver pool for a company and level at a
/// point in time.
///
/// Active registrations at the level contribute their effective user
/// (delegate substituted during an active window). The pool is
/// deduplicated and order-stable.
#[must_use]
pub fn eligible_pool(
    approvers: &[Approver],
    company: CompanyId,
    level_order: u8,
    now: DateTime<Utc>,
) -> Vec<UserId> {
    let mut pool = Vec::new();
    for approver in approvers {
        if approver.active && approver.company == company && approver.level_order == level_order {
            let user = approver.effective_user(now);
            if !pool.contains(&user) {
                pool.push(user);
            }
        }
    }
    pool
}
