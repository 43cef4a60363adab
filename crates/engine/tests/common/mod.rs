//! Shared fixtures for engine integration tests.
//!
//! One company, three ledgers (USD leading, EUR and GBP parallel),
//! Copy rules for two accounts into both parallel books, and a
//! two-level approval policy with a supervisor and a manager.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use paraledger_shared::EngineConfig;
use paraledger_shared::types::{
    AccountId, ApprovalLevelId, CompanyId, Currency, DerivationRuleId, LedgerId, UserId,
};

use paraledger_core::approval::{ApprovalLevel, ApprovalPolicy, Approver};
use paraledger_core::currency::{ExchangeRate, RateTable, RateType};
use paraledger_core::document::{Document, DocumentKey, DocumentLine, Side};
use paraledger_core::posting::{DerivationRule, RuleKind, RuleTable};
use paraledger_core::registry::{AccountingPrinciple, Ledger, LedgerRegistry};
use paraledger_core::snapshot::ConfigSnapshot;
use paraledger_engine::Engine;

pub struct Harness {
    pub engine: Engine,
    /// A snapshot with every closing rate present, for remediation
    /// scenarios against an engine built without the GBP rate.
    pub full_snapshot: Arc<ConfigSnapshot>,
    pub company: CompanyId,
    pub expense: AccountId,
    pub payable: AccountId,
    pub submitter: UserId,
    pub supervisor: UserId,
    pub manager: UserId,
    pub leading: LedgerId,
    pub eur: LedgerId,
    pub gbp: LedgerId,
}

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`, at most once per
/// test binary.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn posting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn ledger(code: &str, currency: Currency, leading: bool) -> Ledger {
    Ledger {
        id: LedgerId::new(),
        code: code.to_string(),
        name: format!("Ledger {code}"),
        base_currency: currency,
        principle: if leading {
            AccountingPrinciple::LocalGaap
        } else {
            AccountingPrinciple::Ifrs
        },
        leading,
    }
}

fn copy_rule(source: LedgerId, target: LedgerId, account: AccountId) -> DerivationRule {
    DerivationRule {
        id: DerivationRuleId::new(),
        source_ledger: source,
        target_ledger: target,
        source_account: account,
        kind: RuleKind::Copy,
        target_account: None,
        company: None,
        active: true,
    }
}

fn closing_rate(to: Currency, rate: Decimal) -> ExchangeRate {
    ExchangeRate {
        from: Currency::Usd,
        to,
        rate_type: RateType::Closing,
        rate_date: posting_date(),
        rate,
    }
}

/// Builds an engine with the standard fixture configuration.
///
/// When `with_gbp_rate` is false, the GBP ledger has no closing rate
/// and every fan-out to it fails with `RATE_NOT_FOUND`.
pub fn build(config: EngineConfig, with_gbp_rate: bool) -> Harness {
    build_inner(config, with_gbp_rate, true)
}

fn build_inner(config: EngineConfig, with_gbp_rate: bool, with_roster: bool) -> Harness {
    init_tracing();

    let company = CompanyId::new();
    let expense = AccountId::new();
    let payable = AccountId::new();

    let leading = ledger("0L", Currency::Usd, true);
    let eur = ledger("2L", Currency::Eur, false);
    let gbp = ledger("3L", Currency::Gbp, false);
    let (leading_id, eur_id, gbp_id) = (leading.id, eur.id, gbp.id);

    let registry = LedgerRegistry::new(vec![leading, eur, gbp]).expect("valid registry");

    let rules = RuleTable::new(vec![
        copy_rule(leading_id, eur_id, expense),
        copy_rule(leading_id, eur_id, payable),
        copy_rule(leading_id, gbp_id, expense),
        copy_rule(leading_id, gbp_id, payable),
    ]);

    let full_rates = RateTable::new(vec![
        closing_rate(Currency::Eur, dec!(0.92)),
        closing_rate(Currency::Gbp, dec!(0.79)),
    ])
    .expect("valid rates");
    let rates = if with_gbp_rate {
        full_rates.clone()
    } else {
        RateTable::new(vec![closing_rate(Currency::Eur, dec!(0.92))]).expect("valid rates")
    };

    let policy = ApprovalPolicy::new(vec![
        ApprovalLevel {
            id: ApprovalLevelId::new(),
            company,
            order: 1,
            name: "Supervisor".to_string(),
            min_amount: Decimal::ZERO,
            max_amount: Some(dec!(10000)),
        },
        ApprovalLevel {
            id: ApprovalLevelId::new(),
            company,
            order: 2,
            name: "Manager".to_string(),
            min_amount: dec!(10000),
            max_amount: None,
        },
    ])
    .expect("valid policy");

    let submitter = UserId::new();
    let supervisor = UserId::new();
    let manager = UserId::new();
    let roster = if with_roster {
        vec![
            Approver::new(supervisor, company, 1),
            Approver::new(manager, company, 2),
        ]
    } else {
        Vec::new()
    };

    let full_snapshot = Arc::new(ConfigSnapshot::new(
        registry.clone(),
        rules.clone(),
        full_rates,
        policy.clone(),
    ));
    let snapshot = Arc::new(ConfigSnapshot::new(registry, rules, rates, policy));
    let engine = Engine::new(config, snapshot, roster).expect("engine builds");

    Harness {
        engine,
        full_snapshot,
        company,
        expense,
        payable,
        submitter,
        supervisor,
        manager,
        leading: leading_id,
        eur: eur_id,
        gbp: gbp_id,
    }
}

/// The default harness: all rates present, default configuration.
pub fn harness() -> Harness {
    build(EngineConfig::default(), true)
}

/// A harness with an empty approver roster, so every submission fails
/// pool resolution.
pub fn harness_without_approvers() -> Harness {
    build_inner(EngineConfig::default(), true, false)
}

/// A balanced two-line USD document: debit expense, credit payable.
pub fn balanced_document(h: &Harness, number: u32, amount: Decimal) -> Document {
    Document::draft(
        DocumentKey {
            company: h.company,
            fiscal_year: 2026,
            number,
        },
        Currency::Usd,
        posting_date(),
        format!("Test document {number}"),
        vec![
            DocumentLine {
                line_no: 1,
                account: h.expense,
                side: Side::Debit,
                amount,
                ledger: None,
                currency: Currency::Usd,
                cost_center: Some("CC-100".to_string()),
                profit_center: None,
                memo: None,
            },
            DocumentLine {
                line_no: 2,
                account: h.payable,
                side: Side::Credit,
                amount,
                ledger: None,
                currency: Currency::Usd,
                cost_center: None,
                profit_center: None,
                memo: None,
            },
        ],
    )
}
