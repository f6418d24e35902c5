use crate::models::{MemberId, Money, Settlement, SettlementPlan};
use serde::{Deserialize, Serialize};

/// A member's aggregate position across a group's expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPosition {
    pub member: MemberId,
    /// Total amount the member advanced as payer.
    pub paid: Money,
    /// Total amount the member owes across all allocations.
    pub owed: Money,
    /// Net position: positive = is owed money, negative = owes money.
    pub net: Money,
}

impl MemberPosition {
    /// Creates a position with zero values.
    pub fn new(member: MemberId) -> Self {
        Self {
            member,
            paid: Money::ZERO,
            owed: Money::ZERO,
            net: Money::ZERO,
        }
    }

    /// Creates a position carrying only a net amount, for balances that
    /// did not come from the aggregator.
    pub fn with_net(member: MemberId, net: Money) -> Self {
        Self {
            member,
            paid: Money::ZERO,
            owed: Money::ZERO,
            net,
        }
    }

    /// Returns `None` if the running totals would overflow.
    pub(crate) fn add_paid(&mut self, amount: Money) -> Option<()> {
        self.paid = self.paid.checked_add(amount)?;
        self.net = self.net.checked_add(amount)?;
        Some(())
    }

    pub(crate) fn add_owed(&mut self, amount: Money) -> Option<()> {
        self.owed = self.owed.checked_add(amount)?;
        self.net = self.net.checked_sub(amount)?;
        Some(())
    }

    pub fn is_creditor(&self, epsilon: Money) -> bool {
        self.net > epsilon.abs()
    }

    pub fn is_debtor(&self, epsilon: Money) -> bool {
        self.net < -epsilon.abs()
    }

    pub fn is_settled(&self, epsilon: Money) -> bool {
        self.net.is_within(epsilon)
    }
}

/// Net balance per member, kept in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap {
    positions: Vec<MemberPosition>,
}

impl BalanceMap {
    pub fn new(positions: Vec<MemberPosition>) -> Self {
        Self { positions }
    }

    /// Builds a map from bare net amounts, in the given order.
    pub fn from_nets<I, M>(nets: I) -> Self
    where
        I: IntoIterator<Item = (M, Money)>,
        M: Into<MemberId>,
    {
        Self::new(
            nets.into_iter()
                .map(|(member, net)| MemberPosition::with_net(member.into(), net))
                .collect(),
        )
    }

    pub fn positions(&self) -> &[MemberPosition] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberPosition> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, member: &MemberId) -> Option<&MemberPosition> {
        self.positions.iter().find(|p| &p.member == member)
    }

    pub(crate) fn get_mut(&mut self, member: &MemberId) -> Option<&mut MemberPosition> {
        self.positions.iter_mut().find(|p| &p.member == member)
    }

    /// Net amount of `member`, zero for unknown members.
    pub fn net_of(&self, member: &MemberId) -> Money {
        self.get(member).map(|p| p.net).unwrap_or(Money::ZERO)
    }

    /// Sum of all net amounts; zero for a closed ledger, `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        Money::checked_sum(self.positions.iter().map(|p| p.net))
    }

    /// Applies a payment: the payer's debt shrinks and the payee's credit shrinks.
    pub fn apply(&mut self, settlement: &Settlement) {
        if let Some(from) = self.get_mut(&settlement.from) {
            from.net += settlement.amount;
        }
        if let Some(to) = self.get_mut(&settlement.to) {
            to.net -= settlement.amount;
        }
    }

    /// Returns the balances left after applying every settlement of `plan`.
    pub fn after(&self, plan: &SettlementPlan) -> BalanceMap {
        let mut remaining = self.clone();
        for settlement in plan.iter() {
            remaining.apply(settlement);
        }
        remaining
    }

    pub fn is_settled(&self, epsilon: Money) -> bool {
        self.positions.iter().all(|p| p.is_settled(epsilon))
    }

    /// Number of members with a balance outside `epsilon`.
    pub fn open_count(&self, epsilon: Money) -> usize {
        self.positions.iter().filter(|p| !p.is_settled(epsilon)).count()
    }
}

/// Summary of a computed group ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub member_count: usize,
    pub total_spent: Money,
    pub creditors: usize,
    pub debtors: usize,
    pub settled_members: usize,
    pub transfer_count: usize,
    pub transfer_volume: Money,
}

impl LedgerSummary {
    /// Returns `None` when the spent total or the transfer volume overflows.
    pub fn from_ledger(balances: &BalanceMap, plan: &SettlementPlan, epsilon: Money) -> Option<Self> {
        Some(Self {
            member_count: balances.len(),
            total_spent: Money::checked_sum(balances.iter().map(|p| p.paid))?,
            creditors: balances.iter().filter(|p| p.is_creditor(epsilon)).count(),
            debtors: balances.iter().filter(|p| p.is_debtor(epsilon)).count(),
            settled_members: balances.iter().filter(|p| p.is_settled(epsilon)).count(),
            transfer_count: plan.len(),
            transfer_volume: plan.volume()?,
        })
    }
}
