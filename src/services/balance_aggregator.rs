use crate::error::{EngineError, Result};
use crate::models::{BalanceMap, Expense, Member, MemberPosition};
use crate::observability::get_metrics;
use std::collections::HashSet;

/// Folds stored expense allocations into per-member net balances.
///
/// The map is rebuilt from scratch on every call; nothing is carried between
/// calls, so the result depends only on the member list and the expense set,
/// never on the order of the expenses.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceAggregator;

impl BalanceAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, members: &[Member], expenses: &[Expense]) -> Result<BalanceMap> {
        self.fold(members, expenses).map_err(|e| {
            get_metrics().record_rejection("aggregate", e.code());
            tracing::warn!(expenses = expenses.len(), "Aggregation rejected: {}", e);
            e
        })
    }

    fn fold(&self, members: &[Member], expenses: &[Expense]) -> Result<BalanceMap> {
        let mut seen = HashSet::with_capacity(members.len());
        if let Some(duplicate) = members.iter().find(|m| !seen.insert(&m.id)) {
            return Err(EngineError::InvalidGroup(format!(
                "member '{}' appears more than once",
                duplicate.id
            )));
        }

        let mut balances = BalanceMap::new(members.iter().map(|m| MemberPosition::new(m.id.clone())).collect());

        for expense in expenses {
            self.apply_expense(&mut balances, expense)?;
        }

        debug_assert_eq!(balances.iter().map(|p| i128::from(p.net.minor())).sum::<i128>(), 0);
        Ok(balances)
    }

    fn apply_expense(&self, balances: &mut BalanceMap, expense: &Expense) -> Result<()> {
        if !expense.amount.is_positive() {
            return Err(EngineError::InvalidExpense(format!(
                "expense {} has non-positive amount {}",
                expense.id, expense.amount
            )));
        }

        let allocated = expense.allocation.total().ok_or_else(|| overflow(expense))?;
        if allocated != expense.amount {
            return Err(EngineError::SplitMismatch(format!(
                "expense {} allocates {} of {}",
                expense.id, allocated, expense.amount
            )));
        }

        let mut allocated_members = HashSet::with_capacity(expense.allocation.len());
        for share in expense.allocation.iter() {
            if share.amount.is_negative() {
                return Err(EngineError::InvalidExpense(format!(
                    "expense {} gives '{}' a negative share of {}",
                    expense.id, share.member, share.amount
                )));
            }
            if !allocated_members.insert(&share.member) {
                return Err(EngineError::InvalidExpense(format!(
                    "expense {} allocates to '{}' more than once",
                    expense.id, share.member
                )));
            }
            if balances.get(&share.member).is_none() {
                return Err(EngineError::InvalidExpense(format!(
                    "expense {} allocates to '{}' who is not a group member",
                    expense.id, share.member
                )));
            }
        }
        // Shares are unique group members, so equal counts mean full coverage.
        if allocated_members.len() != balances.len() {
            return Err(EngineError::InvalidExpense(format!(
                "expense {} allocates to {} of {} members",
                expense.id,
                allocated_members.len(),
                balances.len()
            )));
        }

        let payer = balances.get_mut(&expense.payer).ok_or_else(|| {
            EngineError::InvalidExpense(format!(
                "expense {} is paid by '{}' who is not a group member",
                expense.id, expense.payer
            ))
        })?;
        payer.add_paid(expense.amount).ok_or_else(|| overflow(expense))?;

        for share in expense.allocation.iter() {
            if let Some(position) = balances.get_mut(&share.member) {
                position.add_owed(share.amount).ok_or_else(|| overflow(expense))?;
            }
        }

        Ok(())
    }
}

fn overflow(expense: &Expense) -> EngineError {
    EngineError::InvalidExpense(format!("expense {} overflows a member balance", expense.id))
}
