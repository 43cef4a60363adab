//! Property-based tests for the derivation engine.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use paraledger_shared::types::{
    AccountId, CompanyId, Currency, DerivationRuleId, LedgerId,
};

use crate::currency::{ExchangeRate, RateTable, RateType};
use crate::document::{Document, DocumentKey, DocumentLine, Side};
use crate::posting::derive::derive_for_ledger;
use crate::posting::rules::{DerivationRule, RuleKind, RuleTable};
use crate::registry::{AccountingPrinciple, Ledger};

fn posting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn eur_ledger() -> Ledger {
    Ledger {
        id: LedgerId::new(),
        code: "2L".to_string(),
        name: "IFRS ledger".to_string(),
        base_currency: Currency::Eur,
        principle: AccountingPrinciple::Ifrs,
        leading: false,
    }
}

/// Builds a balanced document: n debit lines in cents plus one credit
/// line covering the total.
fn balanced_document(company: CompanyId, account: AccountId, debit_cents: &[i64]) -> Document {
    let mut lines: Vec<DocumentLine> = debit_cents
        .iter()
        .enumerate()
        .map(|(i, &cents)| DocumentLine {
            line_no: u32::try_from(i).unwrap() + 1,
            account,
            side: Side::Debit,
            amount: Decimal::new(cents, 2),
            ledger: None,
            currency: Currency::Usd,
            cost_center: None,
            profit_center: None,
            memo: None,
        })
        .collect();
    let total: i64 = debit_cents.iter().sum();
    lines.push(DocumentLine {
        line_no: u32::try_from(lines.len()).unwrap() + 1,
        account,
        side: Side::Credit,
        amount: Decimal::new(total, 2),
        ledger: None,
        currency: Currency::Usd,
        cost_center: None,
        profit_center: None,
        memo: None,
    });
    Document::draft(
        DocumentKey {
            company,
            fiscal_year: 2026,
            number: 1,
        },
        Currency::Usd,
        posting_date(),
        "Generated".to_string(),
        lines,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every successful derivation balances exactly, for arbitrary line
    /// splits and rates that force non-exact rounding.
    #[test]
    fn prop_derived_document_balances(
        debit_cents in prop::collection::vec(1i64..=5_000_000, 1..8),
        rate_milli in 100i64..=5_000,
    ) {
        let leading = LedgerId::new();
        let target = eur_ledger();
        let account = AccountId::new();
        let company = CompanyId::new();

        let doc = balanced_document(company, account, &debit_cents);
        let rules = RuleTable::new(vec![DerivationRule {
            id: DerivationRuleId::new(),
            source_ledger: leading,
            target_ledger: target.id,
            source_account: account,
            kind: RuleKind::Copy,
            target_account: None,
            company: None,
            active: true,
        }]);
        let rates = RateTable::new(vec![ExchangeRate {
            from: Currency::Usd,
            to: Currency::Eur,
            rate_type: RateType::Closing,
            rate_date: posting_date(),
            rate: Decimal::new(rate_milli, 3),
        }]).unwrap();

        if let Ok(derived) = derive_for_ledger(&doc, leading, &target, &rules, &rates) {
            prop_assert!(derived.is_balanced());
            prop_assert_eq!(derived.lines.len(), debit_cents.len() + 1);
            for l in &derived.lines {
                prop_assert!(l.amount >= Decimal::ZERO);
                prop_assert_eq!(l.amount.scale() <= 2, true);
            }
        }
    }

    /// The per-line rounding residual never exceeds one minor unit per
    /// line, so derivation of a balanced Copy-only document never
    /// reports `ResidualTooLarge`.
    #[test]
    fn prop_copy_residual_within_bound(
        debit_cents in prop::collection::vec(1i64..=5_000_000, 1..8),
        rate_milli in 100i64..=5_000,
    ) {
        let leading = LedgerId::new();
        let target = eur_ledger();
        let account = AccountId::new();
        let company = CompanyId::new();

        let doc = balanced_document(company, account, &debit_cents);
        let rules = RuleTable::new(vec![DerivationRule {
            id: DerivationRuleId::new(),
            source_ledger: leading,
            target_ledger: target.id,
            source_account: account,
            kind: RuleKind::Copy,
            target_account: None,
            company: None,
            active: true,
        }]);
        let rates = RateTable::new(vec![ExchangeRate {
            from: Currency::Usd,
            to: Currency::Eur,
            rate_type: RateType::Closing,
            rate_date: posting_date(),
            rate: Decimal::new(rate_milli, 3),
        }]).unwrap();

        let result = derive_for_ledger(&doc, leading, &target, &rules, &rates);
        prop_assert!(
            !matches!(result, Err(crate::posting::PostingError::ResidualTooLarge { .. })),
            "unexpected ResidualTooLarge: {:?}",
            result
        );
    }
}
