//! Engine configuration management.

use serde::Deserialize;

/// Engine configuration.
///
/// Controls posting-policy knobs that are deployment decisions rather
/// than business configuration (ledgers, rules, and rates are data, not
/// settings, and live in the configuration snapshot).
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Posting behavior configuration.
    #[serde(default)]
    pub posting: PostingConfig,
    /// Approval behavior configuration.
    #[serde(default)]
    pub approval: ApprovalConfig,
}

/// Posting fan-out configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// When true, a source document stays in Approved until every
    /// non-leading ledger posts successfully. When false (default),
    /// the document flips to Posted and partial failures are flagged
    /// for manual remediation.
    #[serde(default)]
    pub hold_until_all_ledgers: bool,
    /// Worker threads for the per-ledger fan-out pool (0 = one per ledger,
    /// bounded by the rayon default).
    #[serde(default = "default_fan_out_threads")]
    pub fan_out_threads: usize,
}

fn default_fan_out_threads() -> usize {
    0
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            hold_until_all_ledgers: false,
            fan_out_threads: default_fan_out_threads(),
        }
    }
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    /// Hours after submission before an open instance is flagged overdue
    /// for escalation reporting. The state machine never auto-transitions;
    /// external schedulers poll the flag.
    #[serde(default = "default_decision_deadline_hours")]
    pub decision_deadline_hours: i64,
}

fn default_decision_deadline_hours() -> i64 {
    72
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            decision_deadline_hours: default_decision_deadline_hours(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            posting: PostingConfig::default(),
            approval: ApprovalConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Pick up a .env file when present; ignore its absence.
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PARALEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
