//! Derivation of parallel-ledger documents from a leading-ledger source.
//!
//! Derivation is all-or-nothing per target ledger: a single rule gap or
//! missing rate fails the whole derived document for that ledger, while
//! other ledgers proceed independently.

use rust_decimal::Decimal;

use paraledger_shared::types::LedgerId;

use crate::currency::{convert_amount, round_half_up, RateTable, RateType};
use crate::document::{Document, Side};
use crate::posting::error::PostingError;
use crate::posting::rules::{RuleKind, RuleTable};
use crate::posting::types::{DerivedDocument, DerivedLine};
use crate::registry::Ledger;

/// Derives a source document into one target ledger.
///
/// Lines pinned to a different ledger are skipped; unpinned lines and
/// lines pinned to the target are derived. Each derived line resolves
/// exactly one rule, translates at the Closing rate for the posting
/// date, and rounds half-up to the target currency's minor units.
/// Rounding residuals up to one minor unit per derived line are
/// absorbed by the last line.
///
/// # Errors
///
/// Returns a `PostingError` on a rule gap, ambiguous rules, a missing
/// rate, or a residual exceeding the absorption bound.
pub fn derive_for_ledger(
    source: &Document,
    leading: LedgerId,
    target: &Ledger,
    rules: &RuleTable,
    rates: &RateTable,
) -> Result<DerivedDocument, PostingError> {
    let minor_units = target.base_currency.minor_units();
    let mut lines = Vec::with_capacity(source.lines.len());

    for line in &source.lines {
        if line.ledger.is_some_and(|l| l != target.id) {
            continue;
        }

        let rule = rules.resolve(source.key.company, leading, target.id, line.account)?;
        let rate = rates.rate(
            line.currency,
            target.base_currency,
            source.posting_date,
            RateType::Closing,
        )?;

        let translated = convert_amount(line.amount, rate, minor_units);
        let amount = match rule.kind {
            RuleKind::Copy => translated,
            RuleKind::Adjust { factor } => round_half_up(translated * factor, minor_units),
        };

        lines.push(DerivedLine {
            line_no: line.line_no,
            account: rule.target_account.unwrap_or(line.account),
            side: line.side,
            amount,
            cost_center: line.cost_center.clone(),
            profit_center: line.profit_center.clone(),
        });
    }

    absorb_residual(&mut lines, target)?;

    let derived = DerivedDocument {
        source: source.id,
        ledger: target.id,
        currency: target.base_currency,
        posting_date: source.posting_date,
        lines,
    };

    if !derived.is_balanced() {
        return Err(PostingError::UnbalancedDerived {
            ledger: target.id,
            debits: derived.total_debit(),
            credits: derived.total_credit(),
        });
    }

    Ok(derived)
}

/// Folds any rounding residual into the last derived line.
///
/// The residual bound is one minor unit per derived line; anything
/// larger indicates wrong amounts rather than rounding noise.
fn absorb_residual(lines: &mut [DerivedLine], target: &Ledger) -> Result<(), PostingError> {
    let diff: Decimal = lines.iter().map(DerivedLine::debit).sum::<Decimal>()
        - lines.iter().map(DerivedLine::credit).sum::<Decimal>();
    if diff.is_zero() {
        return Ok(());
    }

    let bound = target.base_currency.minor_unit_value() * Decimal::from(lines.len());
    if diff.abs() > bound {
        return Err(PostingError::ResidualTooLarge {
            ledger: target.id,
            residual: diff.abs(),
            bound,
        });
    }

    let Some(last) = lines.last_mut() else {
        return Ok(());
    };
    let adjusted = match last.side {
        Side::Debit => last.amount - diff,
        Side::Credit => last.amount + diff,
    };
    if adjusted < Decimal::ZERO {
        return Err(PostingError::AbsorptionUnderflow {
            ledger: target.id,
            line_no: last.line_no,
        });
    }
    last.amount = adjusted;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use paraledger_shared::types::{
        AccountId, CompanyId, Currency, DerivationRuleId, LedgerId,
    };

    use crate::currency::{ExchangeRate, RateError};
    use crate::document::{DocumentKey, DocumentLine, Side};
    use crate::posting::rules::DerivationRule;
    use crate::registry::AccountingPrinciple;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger(currency: Currency) -> Ledger {
        Ledger {
            id: LedgerId::new(),
            code: "2L".to_string(),
            name: "IFRS ledger".to_string(),
            base_currency: currency,
            principle: AccountingPrinciple::Ifrs,
            leading: false,
        }
    }

    fn line(no: u32, account: AccountId, side: Side, amount: Decimal) -> DocumentLine {
        DocumentLine {
            line_no: no,
            account,
            side,
            amount,
            ledger: None,
            currency: Currency::Usd,
            cost_center: None,
            profit_center: None,
            memo: None,
        }
    }

    fn document(company: CompanyId, lines: Vec<DocumentLine>) -> Document {
        Document::draft(
            DocumentKey {
                company,
                fiscal_year: 2026,
                number: 42,
            },
            Currency::Usd,
            ymd(2026, 3, 15),
            "Quarterly accrual".to_string(),
            lines,
        )
    }

    fn copy_rule(leading: LedgerId, target: LedgerId, account: AccountId) -> DerivationRule {
        DerivationRule {
            id: DerivationRuleId::new(),
            source_ledger: leading,
            target_ledger: target,
            source_account: account,
            kind: RuleKind::Copy,
            target_account: None,
            company: None,
            active: true,
        }
    }

    fn closing(from: Currency, to: Currency, date: NaiveDate, rate: Decimal) -> ExchangeRate {
        ExchangeRate {
            from,
            to,
            rate_type: RateType::Closing,
            rate_date: date,
            rate,
        }
    }

    struct Fixture {
        leading: LedgerId,
        target: Ledger,
        expense: AccountId,
        payable: AccountId,
        company: CompanyId,
    }

    impl Fixture {
        fn new(currency: Currency) -> Self {
            Self {
                leading: LedgerId::new(),
                target: ledger(currency),
                expense: AccountId::new(),
                payable: AccountId::new(),
                company: CompanyId::new(),
            }
        }

        fn rules(&self) -> RuleTable {
            RuleTable::new(vec![
                copy_rule(self.leading, self.target.id, self.expense),
                copy_rule(self.leading, self.target.id, self.payable),
            ])
        }
    }

    #[test]
    fn test_usd_to_eur_translation() {
        let fx = Fixture::new(Currency::Eur);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(1000.00)),
                line(2, fx.payable, Side::Credit, dec!(1000.00)),
            ],
        );
        let rates = RateTable::new(vec![closing(
            Currency::Usd,
            Currency::Eur,
            ymd(2026, 3, 15),
            dec!(0.92),
        )])
        .unwrap();

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();

        assert_eq!(derived.currency, Currency::Eur);
        assert_eq!(derived.lines.len(), 2);
        assert_eq!(derived.lines[0].amount, dec!(920.00));
        assert_eq!(derived.lines[1].amount, dec!(920.00));
        assert!(derived.is_balanced());
    }

    #[test]
    fn test_same_currency_no_rate_needed() {
        let fx = Fixture::new(Currency::Usd);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(500.00)),
                line(2, fx.payable, Side::Credit, dec!(500.00)),
            ],
        );

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &RateTable::default())
                .unwrap();
        assert_eq!(derived.lines[0].amount, dec!(500.00));
    }

    #[test]
    fn test_rule_gap_fails_whole_ledger() {
        let fx = Fixture::new(Currency::Usd);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(500.00)),
                line(2, fx.payable, Side::Credit, dec!(500.00)),
            ],
        );
        // Only the expense account has a rule.
        let rules = RuleTable::new(vec![copy_rule(fx.leading, fx.target.id, fx.expense)]);

        let result = derive_for_ledger(&doc, fx.leading, &fx.target, &rules, &RateTable::default());
        assert!(matches!(result, Err(PostingError::NoDerivationRule { .. })));
    }

    #[test]
    fn test_missing_rate_fails() {
        let fx = Fixture::new(Currency::Eur);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(500.00)),
                line(2, fx.payable, Side::Credit, dec!(500.00)),
            ],
        );

        let result =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &RateTable::default());
        assert!(matches!(
            result,
            Err(PostingError::Rate(RateError::RateNotFound { .. }))
        ));
    }

    #[test]
    fn test_residual_absorbed_by_last_line() {
        let fx = Fixture::new(Currency::Eur);
        // 33.335 rounds to 33.34 twice on the debit side (66.68) while
        // the single credit 66.67 rounds to itself: residual 0.01.
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(33.335)),
                line(2, fx.expense, Side::Debit, dec!(33.335)),
                line(3, fx.payable, Side::Credit, dec!(66.67)),
            ],
        );
        let rates = RateTable::new(vec![closing(
            Currency::Usd,
            Currency::Eur,
            ymd(2026, 3, 15),
            dec!(1.00),
        )])
        .unwrap();

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();
        assert!(derived.is_balanced());
        assert_eq!(derived.lines[0].amount, dec!(33.34));
        assert_eq!(derived.lines[1].amount, dec!(33.34));
        // Last line absorbed the cent.
        assert_eq!(derived.lines[2].amount, dec!(66.68));
    }

    #[test]
    fn test_absorption_is_deterministic() {
        let fx = Fixture::new(Currency::Eur);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(33.335)),
                line(2, fx.expense, Side::Debit, dec!(33.335)),
                line(3, fx.payable, Side::Credit, dec!(66.67)),
            ],
        );
        let rates = RateTable::new(vec![closing(
            Currency::Usd,
            Currency::Eur,
            ymd(2026, 3, 15),
            dec!(1.00),
        )])
        .unwrap();

        let a = derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();
        let b = derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();
        for (la, lb) in a.lines.iter().zip(&b.lines) {
            assert_eq!(la.amount, lb.amount);
        }
    }

    #[test]
    fn test_residual_beyond_bound_fails() {
        let fx = Fixture::new(Currency::Eur);
        // An adjust factor on only one side creates an imbalance far
        // beyond rounding noise.
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
            ],
        );
        let mut adjust = copy_rule(fx.leading, fx.target.id, fx.expense);
        adjust.kind = RuleKind::Adjust {
            factor: dec!(0.50),
        };
        let rules = RuleTable::new(vec![
            adjust,
            copy_rule(fx.leading, fx.target.id, fx.payable),
        ]);

        let result = derive_for_ledger(&doc, fx.leading, &fx.target, &rules, &RateTable::default());
        assert!(matches!(result, Err(PostingError::ResidualTooLarge { .. })));
    }

    #[test]
    fn test_adjust_factor_on_both_sides() {
        let fx = Fixture::new(Currency::Usd);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
            ],
        );
        let mut debit_rule = copy_rule(fx.leading, fx.target.id, fx.expense);
        debit_rule.kind = RuleKind::Adjust {
            factor: dec!(0.85),
        };
        let mut credit_rule = copy_rule(fx.leading, fx.target.id, fx.payable);
        credit_rule.kind = RuleKind::Adjust {
            factor: dec!(0.85),
        };
        let rules = RuleTable::new(vec![debit_rule, credit_rule]);

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &rules, &RateTable::default()).unwrap();
        assert_eq!(derived.lines[0].amount, dec!(85.00));
        assert!(derived.is_balanced());
    }

    #[test]
    fn test_target_account_override() {
        let fx = Fixture::new(Currency::Usd);
        let remapped = AccountId::new();
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
            ],
        );
        let mut expense_rule = copy_rule(fx.leading, fx.target.id, fx.expense);
        expense_rule.target_account = Some(remapped);
        let rules = RuleTable::new(vec![
            expense_rule,
            copy_rule(fx.leading, fx.target.id, fx.payable),
        ]);

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &rules, &RateTable::default()).unwrap();
        assert_eq!(derived.lines[0].account, remapped);
        assert_eq!(derived.lines[1].account, fx.payable);
    }

    #[test]
    fn test_zero_decimal_currency() {
        let fx = Fixture::new(Currency::Jpy);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
            ],
        );
        let rates = RateTable::new(vec![closing(
            Currency::Usd,
            Currency::Jpy,
            ymd(2026, 3, 15),
            dec!(151.237),
        )])
        .unwrap();

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();
        // 100 * 151.237 = 15123.7 -> 15124, no fractional yen.
        assert_eq!(derived.lines[0].amount, dec!(15124));
        assert!(derived.is_balanced());
    }

    #[test]
    fn test_lines_pinned_to_other_ledger_skipped() {
        let fx = Fixture::new(Currency::Usd);
        let other = LedgerId::new();
        let mut pinned = line(3, fx.expense, Side::Debit, dec!(999.00));
        pinned.ledger = Some(other);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
                pinned,
            ],
        );

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &RateTable::default())
                .unwrap();
        assert_eq!(derived.lines.len(), 2);
    }

    #[test]
    fn test_historical_rate_lookup() {
        let fx = Fixture::new(Currency::Eur);
        let doc = document(
            fx.company,
            vec![
                line(1, fx.expense, Side::Debit, dec!(100.00)),
                line(2, fx.payable, Side::Credit, dec!(100.00)),
            ],
        );
        // Only an older rate exists; it applies.
        let rates = RateTable::new(vec![closing(
            Currency::Usd,
            Currency::Eur,
            ymd(2026, 2, 28),
            dec!(0.90),
        )])
        .unwrap();

        let derived =
            derive_for_ledger(&doc, fx.leading, &fx.target, &fx.rules(), &rates).unwrap();
        assert_eq!(derived.lines[0].amount, dec!(90.00));
    }
}
