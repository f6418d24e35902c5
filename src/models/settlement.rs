use crate::models::{BalanceMap, MemberId, Money};
use serde::{Deserialize, Serialize};

/// A suggested payment from a debtor to a creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

impl Settlement {
    pub fn new(from: MemberId, to: MemberId, amount: Money) -> Self {
        Self { from, to, amount }
    }
}

/// Ordered list of settlements that zeroes a balance map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementPlan {
    settlements: Vec<Settlement>,
}

impl SettlementPlan {
    pub fn new(settlements: Vec<Settlement>) -> Self {
        Self { settlements }
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Settlement> {
        self.settlements.iter()
    }

    pub fn len(&self) -> usize {
        self.settlements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settlements.is_empty()
    }

    /// Total amount moved by the plan, `None` on overflow.
    pub fn volume(&self) -> Option<Money> {
        Money::checked_sum(self.settlements.iter().map(|s| s.amount))
    }

    /// True if applying the plan to `balances` leaves every member within
    /// `epsilon` of zero.
    pub fn verify(&self, balances: &BalanceMap, epsilon: Money) -> bool {
        balances.after(self).is_settled(epsilon)
    }
}

impl IntoIterator for SettlementPlan {
    type Item = Settlement;
    type IntoIter = std::vec::IntoIter<Settlement>;

    fn into_iter(self) -> Self::IntoIter {
        self.settlements.into_iter()
    }
}
