use crate::config::EngineSettings;
use crate::error::{EngineError, Result};
use crate::models::{
    Allocation, ExactShare, Expense, ExpenseDraft, ExpenseUpdate, Member, MemberId, Money, PercentShare, Share,
    Split,
};
use crate::observability::get_metrics;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

/// Divides an expense amount between group members.
///
/// Every allocation covers each member exactly once, in group order, and sums
/// to the expense amount to the cent. Members missing from EXACT or PERCENT
/// weights owe nothing.
///
/// EXACT weights may miss the amount by up to `split_tolerance_minor`; that
/// gap is absorbed into the shares rather than rejected, so the stored
/// allocation still sums exactly. PERCENT rounding residue is absorbed the
/// same way. A surplus lands on the first member in canonical order, a
/// shortfall is taken back in order without pushing any share below zero.
#[derive(Debug, Clone, Default)]
pub struct SplitAllocator {
    settings: EngineSettings,
}

impl SplitAllocator {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Allocates `amount` across `members` according to `split`.
    pub fn allocate(&self, amount: Money, split: &Split, members: &[Member]) -> Result<Allocation> {
        match self.allocate_checked(amount, split, members) {
            Ok(allocation) => {
                get_metrics().record_allocation(split.policy().as_str(), allocation.len());
                tracing::debug!(
                    policy = %split.policy(),
                    amount = %amount,
                    members = allocation.len(),
                    "Allocated expense"
                );
                Ok(allocation)
            }
            Err(e) => {
                get_metrics().record_rejection("allocate", e.code());
                tracing::warn!(policy = %split.policy(), "Allocation rejected: {}", e);
                Err(e)
            }
        }
    }

    fn allocate_checked(&self, amount: Money, split: &Split, members: &[Member]) -> Result<Allocation> {
        validate_expense_inputs(amount, members)?;

        let owed = match split {
            Split::Equal => equal_shares(amount, members.len()),
            Split::Exact(weights) => self.exact_shares(amount, weights, members)?,
            Split::Percent(weights) => self.percent_shares(amount, weights, members)?,
        };

        let shares = members
            .iter()
            .zip(owed)
            .map(|(member, owed)| Share::new(member.id.clone(), owed))
            .collect();
        let allocation = Allocation::new(shares);
        debug_assert_eq!(allocation.total(), Some(amount));

        Ok(allocation)
    }

    fn exact_shares(&self, amount: Money, weights: &[ExactShare], members: &[Member]) -> Result<Vec<Money>> {
        check_weight_members(weights.iter().map(|w| &w.member), members)?;

        if let Some(negative) = weights.iter().find(|w| w.amount.is_negative()) {
            return Err(EngineError::InvalidSplit(format!(
                "EXACT weight for '{}' is negative ({})",
                negative.member, negative.amount
            )));
        }

        let mut shares = vec![Money::ZERO; members.len()];
        let mut sum = Money::ZERO;
        for weight in weights {
            let index = member_index(members, &weight.member)?;
            shares[index] = weight.amount;
            sum = sum
                .checked_add(weight.amount)
                .ok_or_else(|| EngineError::InvalidSplit("EXACT weights overflow".to_string()))?;
        }

        let residual = amount
            .checked_sub(sum)
            .ok_or_else(|| EngineError::InvalidSplit("EXACT weights overflow".to_string()))?;
        if !residual.is_within(self.settings.split_tolerance()) {
            return Err(EngineError::SplitMismatch(format!(
                "EXACT weights sum to {} but the expense amount is {}",
                sum, amount
            )));
        }

        absorb_residual(&mut shares, residual);
        Ok(shares)
    }

    fn percent_shares(&self, amount: Money, weights: &[PercentShare], members: &[Member]) -> Result<Vec<Money>> {
        check_weight_members(weights.iter().map(|w| &w.member), members)?;

        if let Some(negative) = weights.iter().find(|w| w.percent < Decimal::ZERO) {
            return Err(EngineError::InvalidSplit(format!(
                "PERCENT weight for '{}' is negative ({}%)",
                negative.member, negative.percent
            )));
        }

        let total_percent = weights
            .iter()
            .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(w.percent))
            .ok_or_else(|| EngineError::InvalidSplit("PERCENT weights overflow".to_string()))?;
        if (total_percent - Decimal::ONE_HUNDRED).abs() > self.settings.percent_tolerance {
            return Err(EngineError::SplitMismatch(format!(
                "PERCENT weights sum to {}% instead of 100%",
                total_percent
            )));
        }

        let total = amount.to_decimal();
        let mut shares = vec![Money::ZERO; members.len()];
        for weight in weights {
            let index = member_index(members, &weight.member)?;
            let owed = total
                .checked_mul(weight.percent)
                .map(|v| v / Decimal::ONE_HUNDRED)
                .ok_or_else(|| EngineError::InvalidSplit(format!("PERCENT share for '{}' overflows", weight.member)))?;
            shares[index] = Money::from_decimal(owed)
                .map_err(|e| EngineError::InvalidSplit(format!("PERCENT share for '{}': {}", weight.member, e)))?;
        }

        let residual = Money::checked_sum(shares.iter().copied())
            .and_then(|assigned| amount.checked_sub(assigned))
            .ok_or_else(|| EngineError::InvalidSplit("PERCENT shares overflow".to_string()))?;
        absorb_residual(&mut shares, residual);
        Ok(shares)
    }

    /// Validates a draft and allocates it into a new expense.
    pub fn record_expense(&self, draft: ExpenseDraft, members: &[Member]) -> Result<Expense> {
        ensure_payer(&draft.payer, members)?;
        let allocation = self.allocate(draft.amount, &draft.split, members)?;

        Ok(Expense {
            id: Uuid::new_v4(),
            description: draft.description,
            category: draft.category,
            amount: draft.amount,
            payer: draft.payer,
            split: draft.split,
            allocation,
            date: draft.date.unwrap_or_else(Utc::now),
        })
    }

    /// Returns `expense` with `update` applied. The allocation is recomputed
    /// when the amount or split changes; on error the original is untouched.
    pub fn amend_expense(&self, expense: &Expense, update: ExpenseUpdate, members: &[Member]) -> Result<Expense> {
        let reallocate = update.requires_reallocation();
        let mut amended = expense.clone();

        if let Some(description) = update.description {
            amended.description = description;
        }
        if let Some(category) = update.category {
            amended.category = category;
        }
        if let Some(date) = update.date {
            amended.date = date;
        }
        if let Some(amount) = update.amount {
            amended.amount = amount;
        }
        if let Some(split) = update.split {
            amended.split = split;
        }

        if reallocate {
            ensure_payer(&amended.payer, members)?;
            amended.allocation = self.allocate(amended.amount, &amended.split, members)?;
            tracing::debug!(expense_id = %amended.id, "Reallocated amended expense");
        }

        Ok(amended)
    }
}

/// Floors each share to the minor unit; the remainder goes to the first member.
fn equal_shares(amount: Money, count: usize) -> Vec<Money> {
    let count_minor = count as i64;
    let share = amount.minor().div_euclid(count_minor);
    let remainder = amount.minor().rem_euclid(count_minor);

    let mut shares = vec![Money::from_minor(share); count];
    shares[0] += Money::from_minor(remainder);
    shares
}

/// Settles a signed rounding residual against the shares in group order.
/// A positive residual goes to the first member; a negative one is taken back
/// starting from the first member without pushing any share below zero.
fn absorb_residual(shares: &mut [Money], residual: Money) {
    if residual.is_zero() || shares.is_empty() {
        return;
    }
    if residual.is_positive() {
        shares[0] += residual;
        return;
    }

    let mut excess = residual.abs();
    for share in shares.iter_mut() {
        if excess.is_zero() {
            break;
        }
        let taken = (*share).min(excess);
        *share -= taken;
        excess -= taken;
    }
    if !excess.is_zero() {
        shares[0] -= excess;
    }
}

fn validate_expense_inputs(amount: Money, members: &[Member]) -> Result<()> {
    if members.is_empty() {
        return Err(EngineError::InvalidExpense(
            "an expense needs at least one group member".to_string(),
        ));
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidExpense(format!(
            "expense amount must be positive, got {}",
            amount
        )));
    }

    let mut seen = HashSet::with_capacity(members.len());
    if let Some(duplicate) = members.iter().find(|m| !seen.insert(&m.id)) {
        return Err(EngineError::InvalidGroup(format!(
            "member '{}' appears more than once",
            duplicate.id
        )));
    }
    Ok(())
}

fn check_weight_members<'a>(weights: impl Iterator<Item = &'a MemberId>, members: &[Member]) -> Result<()> {
    let mut seen = HashSet::new();
    for member in weights {
        if !members.iter().any(|m| &m.id == member) {
            return Err(EngineError::InvalidSplit(format!(
                "weight given for '{}' who is not a group member",
                member
            )));
        }
        if !seen.insert(member) {
            return Err(EngineError::InvalidSplit(format!(
                "more than one weight given for '{}'",
                member
            )));
        }
    }
    Ok(())
}

fn member_index(members: &[Member], id: &MemberId) -> Result<usize> {
    members
        .iter()
        .position(|m| &m.id == id)
        .ok_or_else(|| EngineError::InvalidSplit(format!("'{}' is not a group member", id)))
}

fn ensure_payer(payer: &MemberId, members: &[Member]) -> Result<()> {
    if members.iter().any(|m| &m.id == payer) {
        Ok(())
    } else {
        Err(EngineError::InvalidExpense(format!(
            "payer '{}' is not a group member",
            payer
        )))
    }
}
