//! Immutable configuration snapshot.
//!
//! All posting-time configuration travels as one value. The engine
//! resolves an `Arc<ConfigSnapshot>` when a document is submitted or
//! approved; later administrative changes produce a new snapshot and
//! never retroactively alter in-flight work.

use crate::approval::ApprovalPolicy;
use crate::currency::RateTable;
use crate::posting::RuleTable;
use crate::registry::LedgerRegistry;

/// The validated, immutable configuration a posting run sees.
///
/// Each component validates itself at construction (exactly one leading
/// ledger, contiguous approval ranges, positive rates), so holding a
/// snapshot implies a consistent configuration.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// The leading ledger and its parallel books.
    pub registry: LedgerRegistry,
    /// Derivation rules for the fan-out.
    pub rules: RuleTable,
    /// Exchange rates for currency translation.
    pub rates: RateTable,
    /// Approval level ranges per company.
    pub policy: ApprovalPolicy,
}

impl ConfigSnapshot {
    /// Assembles a snapshot from already-validated components.
    #[must_use]
    pub fn new(
        registry: LedgerRegistry,
        rules: RuleTable,
        rates: RateTable,
        policy: ApprovalPolicy,
    ) -> Self {
        Self {
            registry,
            rules,
            rates,
            policy,
        }
    }
}
