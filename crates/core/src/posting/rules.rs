//! Derivation rules mapping leading-ledger lines into parallel ledgers.
//!
//! Rules are configuration, resolved per line at posting time. A
//! company-specific rule shadows a global rule for the same account and
//! ledger pair; within a specificity tier exactly one rule may match.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paraledger_shared::types::{AccountId, CompanyId, DerivationRuleId, LedgerId};

use crate::posting::error::PostingError;

/// How a source line's amount maps into the target ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RuleKind {
    /// Carry the amount over unchanged (before currency translation).
    Copy,
    /// Scale the translated amount by a factor, e.g. a differing
    /// depreciation basis between books.
    Adjust {
        /// Multiplier applied to the translated amount.
        factor: Decimal,
    },
}

/// A single derivation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationRule {
    /// Unique identifier.
    pub id: DerivationRuleId,
    /// The ledger lines are derived from (the leading ledger).
    pub source_ledger: LedgerId,
    /// The ledger this rule derives into.
    pub target_ledger: LedgerId,
    /// The source account the rule applies to.
    pub source_account: AccountId,
    /// Amount mapping.
    pub kind: RuleKind,
    /// Remap the line to this account; `None` keeps the source account.
    pub target_account: Option<AccountId>,
    /// Restrict the rule to one company; `None` applies globally.
    pub company: Option<CompanyId>,
    /// Inactive rules never match.
    pub active: bool,
}

impl DerivationRule {
    fn matches(
        &self,
        company: CompanyId,
        source_ledger: LedgerId,
        target_ledger: LedgerId,
        account: AccountId,
    ) -> bool {
        self.active
            && self.source_ledger == source_ledger
            && self.target_ledger == target_ledger
            && self.source_account == account
            && self.company.is_none_or(|c| c == company)
    }
}

/// The configured set of derivation rules.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<DerivationRule>,
}

impl RuleTable {
    /// Builds a rule table.
    #[must_use]
    pub fn new(rules: Vec<DerivationRule>) -> Self {
        Self { rules }
    }

    /// Resolves the single rule governing a line's derivation.
    ///
    /// Company-specific rules shadow global rules. Within the winning
    /// tier, zero matches is `NoDerivationRule` and more than one is
    /// `AmbiguousRule`.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::NoDerivationRule` or
    /// `PostingError::AmbiguousRule`.
    pub fn resolve(
        &self,
        company: CompanyId,
        source_ledger: LedgerId,
        target_ledger: LedgerId,
        account: AccountId,
    ) -> Result<&DerivationRule, PostingError> {
        let matching: Vec<&DerivationRule> = self
            .rules
            .iter()
            .filter(|r| r.matches(company, source_ledger, target_ledger, account))
            .collect();

        let specific: Vec<&DerivationRule> = matching
            .iter()
            .copied()
            .filter(|r| r.company.is_some())
            .collect();
        let tier = if specific.is_empty() {
            &matching
        } else {
            &specific
        };

        match tier.as_slice() {
            [] => Err(PostingError::NoDerivationRule {
                account,
                target_ledger,
            }),
            [rule] => Ok(*rule),
            _ => Err(PostingError::AmbiguousRule {
                account,
                target_ledger,
            }),
        }
    }
}
