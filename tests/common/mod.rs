#![allow(dead_code)]

use splitledger::models::{Expense, ExpenseDraft, Group, Member, MemberId, Money, Split};
use splitledger::LedgerEngine;

pub fn group(ids: &[&str]) -> Group {
    Group::with_members(
        "Test group",
        ids.iter().map(|id| Member::new(*id, format!("Member {}", id))).collect(),
    )
    .expect("Failed to build group")
}

pub fn id(member: &str) -> MemberId {
    MemberId::from(member)
}

pub fn cents(minor: i64) -> Money {
    Money::from_minor(minor)
}

pub fn record(engine: &LedgerEngine, group: &Group, payer: &str, amount: Money, split: Split) -> Expense {
    engine
        .allocator()
        .record_expense(ExpenseDraft::new("Test expense", amount, payer, split), group.members())
        .expect("Failed to record expense")
}

/// Owed amounts of an expense in group order, in minor units.
pub fn owed(expense: &Expense) -> Vec<i64> {
    expense.allocation.iter().map(|s| s.amount.minor()).collect()
}
