//! Approval levels and amount-based routing.
//!
//! Each company configures an ordered list of approval levels, each
//! covering an amount range `[min, max)`. Ranges must start at zero,
//! be contiguous, and only the last may be unbounded, so every
//! non-negative amount resolves to exactly one level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paraledger_shared::types::{ApprovalLevelId, CompanyId};

use super::error::ApprovalError;

/// An approval level with its amount range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalLevel {
    /// Unique identifier.
    pub id: ApprovalLevelId,
    /// The company this level belongs to.
    pub company: CompanyId,
    /// Level order, 1 = lowest.
    pub order: u8,
    /// Human-readable name, e.g. "Supervisor".
    pub name: String,
    /// Minimum amount, inclusive.
    pub min_amount: Decimal,
    /// Maximum amount, exclusive. `None` = unbounded.
    pub max_amount: Option<Decimal>,
}

impl ApprovalLevel {
    /// Whether this level's range `[min, max)` contains the amount.
    ///
    /// Boundary amounts belong to the next level up because the upper
    /// bound is exclusive.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.is_none_or(|max| amount < max)
    }
}

/// A validated, per-company ordered table of approval levels.
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    levels: Vec<ApprovalLevel>,
}

impl ApprovalPolicy {
    /// Builds a policy, validating each company's ranges.
    ///
    /// Per company: levels sorted by order must start at zero, be
    /// contiguous (`next.min == prev.max`), have non-empty ranges, and
    /// only the last level may be unbounded.
    ///
    /// # Errors
    ///
    /// Returns the first configuration violation found.
    pub fn new(mut levels: Vec<ApprovalLevel>) -> Result<Self, ApprovalError> {
        levels.sort_by(|a, b| (a.company.0, a.order).cmp(&(b.company.0, b.order)));

        let mut companies: Vec<CompanyId> = levels.iter().map(|l| l.company).collect();
        companies.dedup();

        for company in companies {
            let company_levels: Vec<&ApprovalLevel> =
                levels.iter().filter(|l| l.company == company).collect();

            let first = company_levels[0];
            if first.min_amount != Decimal::ZERO {
                return Err(ApprovalError::FirstLevelNotZero { company });
            }

            for window in company_levels.windows(2) {
                let (prev, next) = (window[0], window[1]);
                match prev.max_amount {
                    None => return Err(ApprovalError::UnboundedLevelNotLast { company }),
                    Some(max) => {
                        if max <= prev.min_amount {
                            return Err(ApprovalError::EmptyLevelRange {
                                company,
                                order: prev.order,
                            });
                        }
                        if next.min_amount != max {
                            return Err(ApprovalError::NonContiguousLevels {
                                company,
                                order: next.order,
                            });
                        }
                    }
                }
            }

            if let Some(last) = company_levels.last()
                && let Some(max) = last.max_amount
                && max <= last.min_amount
            {
                return Err(ApprovalError::EmptyLevelRange {
                    company,
                    order: last.order,
                });
            }
        }

        Ok(Self { levels })
    }

    /// Resolves the approval level for a company and amount.
    ///
    /// Pure and deterministic: the smallest level whose range contains
    /// the amount. Negative amounts are rejected; uncovered amounts are
    /// a configuration error (possible when the last level is bounded).
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`, `UnknownCompany`, or `NoLevelForAmount`.
    pub fn resolve(
        &self,
        company: CompanyId,
        amount: Decimal,
    ) -> Result<&ApprovalLevel, ApprovalError> {
        if amount.is_sign_negative() {
            return Err(ApprovalError::InvalidAmount(amount));
        }

        let mut company_levels = self
            .levels
            .iter()
            .filter(|l| l.company == company)
            .peekable();
        if company_levels.peek().is_none() {
            return Err(ApprovalError::UnknownCompany(company));
        }

        company_levels
            .find(|l| l.contains(amount))
            .ok_or(ApprovalError::NoLevelForAmount { company, amount })
    }

    /// All levels for a company, in order.
    pub fn levels_for(&self, company: CompanyId) -> impl Iterator<Item = &ApprovalLevel> {
        self.levels.iter().filter(move |l| l.company == company)
    }
}
