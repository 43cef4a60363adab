//! Ledger registry: the leading book of record and its parallel books.
//!
//! The registry is read-mostly configuration. It is constructed once,
//! validated (exactly one leading ledger), and shared immutably.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paraledger_shared::types::{Currency, LedgerId};

/// Accounting principle a ledger reports under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingPrinciple {
    /// Local GAAP (the usual leading book).
    LocalGaap,
    /// International Financial Reporting Standards.
    Ifrs,
    /// Tax reporting book.
    Tax,
    /// Internal management book.
    Management,
}

/// A configured ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// Unique identifier.
    pub id: LedgerId,
    /// Short code, e.g. "0L", "2L".
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Base currency derived amounts are expressed in.
    pub base_currency: Currency,
    /// Accounting principle tag.
    pub principle: AccountingPrinciple,
    /// True for the single leading ledger.
    pub leading: bool,
}

/// Registry configuration errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No ledger is flagged as leading.
    #[error("Ledger registry has no leading ledger")]
    NoLeadingLedger,

    /// More than one ledger is flagged as leading.
    #[error("Ledger registry has multiple leading ledgers")]
    MultipleLeadingLedgers,

    /// Two ledgers share a code.
    #[error("Duplicate ledger code: {0}")]
    DuplicateLedgerCode(String),
}

/// The validated set of configured ledgers.
#[derive(Debug, Clone)]
pub struct LedgerRegistry {
    ledgers: Vec<Ledger>,
    leading_idx: usize,
}

impl LedgerRegistry {
    /// Builds a registry, validating that exactly one ledger is leading
    /// and codes are unique.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` on invalid configuration.
    pub fn new(ledgers: Vec<Ledger>) -> Result<Self, RegistryError> {
        let mut codes = std::collections::HashSet::new();
        for ledger in &ledgers {
            if !codes.insert(ledger.code.clone()) {
                return Err(RegistryError::DuplicateLedgerCode(ledger.code.clone()));
            }
        }

        let mut leading = ledgers.iter().enumerate().filter(|(_, l)| l.leading);
        let leading_idx = leading.next().ok_or(RegistryError::NoLeadingLedger)?.0;
        if leading.next().is_some() {
            return Err(RegistryError::MultipleLeadingLedgers);
        }

        Ok(Self {
            ledgers,
            leading_idx,
        })
    }

    /// The leading ledger.
    #[must_use]
    pub fn leading(&self) -> &Ledger {
        &self.ledgers[self.leading_idx]
    }

    /// The non-leading (parallel) ledgers, in configuration order.
    pub fn non_leading(&self) -> impl Iterator<Item = &Ledger> {
        self.ledgers.iter().filter(|l| !l.leading)
    }

    /// Number of non-leading ledgers; the posting fan-out width.
    #[must_use]
    pub fn non_leading_count(&self) -> usize {
        self.ledgers.len() - 1
    }

    /// Looks up a ledger by id.
    #[must_use]
    pub fn get(&self, id: LedgerId) -> Option<&Ledger> {
        self.ledgers.iter().find(|l| l.id == id)
    }
}
