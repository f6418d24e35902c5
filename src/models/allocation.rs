use crate::models::{MemberId, Money};
use serde::{Deserialize, Serialize};

/// One member's owed portion of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub member: MemberId,
    pub amount: Money,
}

impl Share {
    pub fn new(member: MemberId, amount: Money) -> Self {
        Self { member, amount }
    }
}

/// Per-member breakdown of an expense, one entry per group member in
/// canonical order. Produced at write time and stored with the expense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation {
    shares: Vec<Share>,
}

impl Allocation {
    pub fn new(shares: Vec<Share>) -> Self {
        Self { shares }
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn iter(&self) -> impl Iterator<Item = &Share> {
        self.shares.iter()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Sum of all owed amounts, `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        Money::checked_sum(self.shares.iter().map(|s| s.amount))
    }

    /// Owed amount of `member`, if the member appears in the allocation.
    pub fn share_of(&self, member: &MemberId) -> Option<Money> {
        self.shares.iter().find(|s| &s.member == member).map(|s| s.amount)
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.shares.iter().any(|s| &s.member == member)
    }
}
