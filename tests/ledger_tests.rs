mod common;

use common::{cents, group, id, owed, record};
use rust_decimal_macros::dec;
use splitledger::models::{Allocation, BalanceMap, ExpenseUpdate, Money, Share, Split};
use splitledger::services::{SettlementPlanner, SplitAllocator};
use splitledger::{compute_group_ledger, EngineError, LedgerEngine};

#[test]
fn test_equal_split_remainder_scenario() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B", "C"]);

    let expense = record(&engine, &group, "A", Money::from_major(100), Split::Equal);
    assert_eq!(owed(&expense), vec![3334, 3333, 3333]);

    let ledger = engine.compute_group_ledger(group.members(), &[expense]).unwrap();
    assert_eq!(ledger.balances.net_of(&id("A")), cents(6666));
    assert_eq!(ledger.balances.net_of(&id("B")), cents(-3333));
    assert_eq!(ledger.balances.net_of(&id("C")), cents(-3333));
}

#[test]
fn test_exact_split_two_members_scenario() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);

    let split = Split::exact([("A", Money::from_major(20)), ("B", Money::from_major(30))]);
    let expense = record(&engine, &group, "A", Money::from_major(50), split);
    assert_eq!(owed(&expense), vec![2000, 3000]);

    let ledger = engine.compute_group_ledger(group.members(), &[expense]).unwrap();
    assert_eq!(ledger.balances.net_of(&id("A")), Money::from_major(30));
    assert_eq!(ledger.balances.net_of(&id("B")), Money::from_major(-30));

    let settlements = ledger.settlements.settlements();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].from, id("B"));
    assert_eq!(settlements[0].to, id("A"));
    assert_eq!(settlements[0].amount.to_decimal(), dec!(30.00));
}

#[test]
fn test_planner_ordering_scenario() {
    let balances = BalanceMap::from_nets([
        ("A", Money::from_major(40)),
        ("B", Money::from_major(-10)),
        ("C", Money::from_major(-10)),
        ("D", Money::from_major(-20)),
    ]);

    let plan = SettlementPlanner::default().plan(&balances).unwrap();
    let transfers: Vec<(String, String, Money)> = plan
        .iter()
        .map(|s| (s.from.to_string(), s.to.to_string(), s.amount))
        .collect();

    assert_eq!(
        transfers,
        vec![
            ("D".to_string(), "A".to_string(), Money::from_major(20)),
            ("B".to_string(), "A".to_string(), Money::from_major(10)),
            ("C".to_string(), "A".to_string(), Money::from_major(10)),
        ]
    );
    assert!(balances.after(&plan).is_settled(Money::ZERO));
}

#[test]
fn test_exact_split_mismatch_scenario() {
    let group = group(&["A", "B"]);
    let split = Split::exact([("A", Money::from_major(45)), ("B", Money::from_major(50))]);

    let err = SplitAllocator::default()
        .allocate(Money::from_major(100), &split, group.members())
        .unwrap_err();

    assert!(matches!(err, EngineError::SplitMismatch(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_already_settled_balances_give_empty_plan() {
    let balances = BalanceMap::from_nets([("A", Money::ZERO), ("B", Money::ZERO), ("C", Money::ZERO)]);
    let plan = SettlementPlanner::default().plan(&balances).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_offsetting_expenses_cancel_out() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);

    let first = record(&engine, &group, "A", Money::from_major(40), Split::Equal);
    let second = record(&engine, &group, "B", Money::from_major(40), Split::Equal);

    let ledger = engine.compute_group_ledger(group.members(), &[first, second]).unwrap();
    assert!(ledger.balances.is_settled(Money::ZERO));
    assert!(ledger.settlements.is_empty());
}

#[test]
fn test_mixed_policies_multi_expense() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B", "C", "D"]);

    let expenses = vec![
        record(&engine, &group, "A", Money::from_major(120), Split::Equal),
        record(
            &engine,
            &group,
            "B",
            Money::from_major(80),
            Split::percent([("A", dec!(25)), ("B", dec!(25)), ("C", dec!(50))]),
        ),
        record(
            &engine,
            &group,
            "C",
            cents(1550),
            Split::exact([("D", cents(1550))]),
        ),
    ];

    let ledger = engine.compute_group_ledger(group.members(), &expenses).unwrap();

    // A: +120 - 30 - 20 = 70; B: +80 - 30 - 20 = 30; C: +15.50 - 30 - 40 = -54.50; D: -30 - 15.50 = -45.50
    assert_eq!(ledger.balances.net_of(&id("A")), Money::from_major(70));
    assert_eq!(ledger.balances.net_of(&id("B")), Money::from_major(30));
    assert_eq!(ledger.balances.net_of(&id("C")), cents(-5450));
    assert_eq!(ledger.balances.net_of(&id("D")), cents(-4550));
    assert_eq!(ledger.balances.total(), Some(Money::ZERO));

    assert!(ledger.settlements.verify(&ledger.balances, Money::ZERO));
    assert!(ledger.settlements.len() <= 3);
}

#[test]
fn test_amended_amount_changes_balances() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);
    let expense = record(&engine, &group, "A", Money::from_major(20), Split::Equal);

    let amended = engine
        .allocator()
        .amend_expense(
            &expense,
            ExpenseUpdate {
                amount: Some(Money::from_major(60)),
                ..Default::default()
            },
            group.members(),
        )
        .unwrap();

    let before = engine.compute_group_ledger(group.members(), &[expense]).unwrap();
    let after = engine.compute_group_ledger(group.members(), &[amended]).unwrap();

    assert_eq!(before.balances.net_of(&id("B")), Money::from_major(-10));
    assert_eq!(after.balances.net_of(&id("B")), Money::from_major(-30));
}

#[test]
fn test_amending_exact_amount_without_new_weights_fails() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);
    let split = Split::exact([("A", Money::from_major(5)), ("B", Money::from_major(5))]);
    let expense = record(&engine, &group, "A", Money::from_major(10), split);

    let err = engine
        .allocator()
        .amend_expense(
            &expense,
            ExpenseUpdate {
                amount: Some(Money::from_major(12)),
                ..Default::default()
            },
            group.members(),
        )
        .unwrap_err();

    assert_eq!(err.code(), "SPLIT_MISMATCH");
    assert_eq!(expense.amount, Money::from_major(10));
}

#[test]
fn test_member_removal_blocked_while_referenced() {
    let engine = LedgerEngine::default();
    let mut group = group(&["A", "B", "C"]);
    let expense = record(&engine, &group, "A", Money::from_major(30), Split::exact([("B", Money::from_major(30))]));

    // C owes nothing but still appears in the allocation with a zero share.
    let err = group.remove_member(&id("C"), std::slice::from_ref(&expense)).unwrap_err();
    assert_eq!(err.code(), "INVALID_GROUP");

    assert!(group.remove_member(&id("C"), &[]).is_ok());
}

#[test]
fn test_free_function_matches_engine() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B", "C"]);
    let expenses = vec![record(&engine, &group, "C", Money::from_major(75), Split::Equal)];

    assert_eq!(
        compute_group_ledger(group.members(), &expenses).unwrap(),
        engine.compute_group_ledger(group.members(), &expenses).unwrap()
    );
}

#[test]
fn test_ledger_json_shape() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);
    let expenses = vec![record(&engine, &group, "A", Money::from_major(50), Split::Equal)];
    let ledger = engine.compute_group_ledger(group.members(), &expenses).unwrap();

    let json = serde_json::to_value(&ledger).unwrap();
    assert_eq!(json["balances"][0]["member"], "A");
    assert_eq!(json["balances"][0]["net"], "25.00");
    assert_eq!(json["settlements"][0]["from"], "B");
    assert_eq!(json["settlements"][0]["amount"], "25.00");
}

#[test]
fn test_stored_allocation_with_negative_share_rejected() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B"]);
    let mut expense = record(&engine, &group, "A", Money::from_major(1), Split::Equal);
    expense.allocation = Allocation::new(vec![
        Share::new(id("A"), Money::from_major(3)),
        Share::new(id("B"), Money::from_major(-2)),
    ]);

    let err = engine.compute_group_ledger(group.members(), &[expense]).unwrap_err();
    assert_eq!(err.code(), "INVALID_EXPENSE");
}

#[test]
fn test_stored_allocation_overflow_is_an_error() {
    let engine = LedgerEngine::default();
    let group = group(&["A", "B", "C"]);
    let mut expense = record(&engine, &group, "A", cents(1), Split::Equal);
    expense.allocation = Allocation::new(vec![
        Share::new(id("A"), cents(i64::MAX)),
        Share::new(id("B"), cents(i64::MAX)),
        Share::new(id("C"), cents(3)),
    ]);

    let err = compute_group_ledger(group.members(), &[expense]).unwrap_err();
    assert_eq!(err.code(), "INVALID_EXPENSE");
}
