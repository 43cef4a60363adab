//! Property-based tests for approval level resolution.

use proptest::prelude::*;
use rust_decimal::Decimal;

use paraledger_shared::types::{ApprovalLevelId, CompanyId};

use crate::approval::policy::{ApprovalLevel, ApprovalPolicy};

/// Strategy for a random non-negative amount with cents.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for contiguous level boundaries: a sorted set of cut points
/// over [0, unbounded).
fn arb_boundaries() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::btree_set(1i64..100_000_000i64, 1..5)
        .prop_map(|cuts| cuts.into_iter().map(|c| Decimal::new(c, 2)).collect())
}

fn policy_from_boundaries(company: CompanyId, boundaries: &[Decimal]) -> ApprovalPolicy {
    let mut levels = Vec::new();
    let mut min = Decimal::ZERO;
    for (i, max) in boundaries.iter().enumerate() {
        levels.push(ApprovalLevel {
            id: ApprovalLevelId::new(),
            company,
            order: u8::try_from(i + 1).unwrap(),
            name: format!("Level {}", i + 1),
            min_amount: min,
            max_amount: Some(*max),
        });
        min = *max;
    }
    levels.push(ApprovalLevel {
        id: ApprovalLevelId::new(),
        company,
        order: u8::try_from(boundaries.len() + 1).unwrap(),
        name: "Top".to_string(),
        min_amount: min,
        max_amount: None,
    });
    ApprovalPolicy::new(levels).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Resolution totality: with contiguous ranges covering [0, inf),
    /// every non-negative amount resolves to exactly one level.
    #[test]
    fn prop_resolution_total(
        boundaries in arb_boundaries(),
        amount in arb_amount(),
    ) {
        let company = CompanyId::new();
        let policy = policy_from_boundaries(company, &boundaries);

        let resolved = policy.resolve(company, amount);
        prop_assert!(resolved.is_ok());

        // Exactly one level contains the amount.
        let containing = policy
            .levels_for(company)
            .filter(|l| l.contains(amount))
            .count();
        prop_assert_eq!(containing, 1);
    }

    /// Boundary amounts route to the higher level: resolving exactly at
    /// a cut point never lands on the level whose exclusive upper bound
    /// it equals.
    #[test]
    fn prop_boundary_routes_up(
        boundaries in arb_boundaries(),
    ) {
        let company = CompanyId::new();
        let policy = policy_from_boundaries(company, &boundaries);

        for boundary in &boundaries {
            let resolved = policy.resolve(company, *boundary).unwrap();
            prop_assert_eq!(resolved.min_amount, *boundary);
        }
    }

    /// Resolution is deterministic: two calls with the same inputs
    /// yield the same level.
    #[test]
    fn prop_resolution_deterministic(
        boundaries in arb_boundaries(),
        amount in arb_amount(),
    ) {
        let company = CompanyId::new();
        let policy = policy_from_boundaries(company, &boundaries);

        let a = policy.resolve(company, amount).unwrap().order;
        let b = policy.resolve(company, amount).unwrap().order;
        prop_assert_eq!(a, b);
    }
}
