use crate::config::EngineSettings;
use crate::error::{EngineError, Result};
use crate::models::{BalanceMap, MemberId, Money, Settlement, SettlementPlan};
use crate::observability::get_metrics;

/// Reduces net balances to a short list of pairwise payments.
///
/// Uses greedy largest-first matching rather than an exact minimum-transfer
/// search (NP-hard in general). Every step zeroes at least one party, so `n`
/// open balances never need more than `n - 1` transfers, though the result is
/// not always the theoretical minimum.
///
/// Ordering is fixed: debtors most-negative first, creditors most-positive
/// first, ties in balance-map (group) order.
#[derive(Debug, Clone)]
pub struct SettlementPlanner {
    epsilon: Money,
    ledger_tolerance: Money,
}

impl Default for SettlementPlanner {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

struct OpenBalance<'a> {
    member: &'a MemberId,
    remaining: i64,
}

impl SettlementPlanner {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            epsilon: settings.settle_epsilon(),
            ledger_tolerance: settings.ledger_tolerance(),
        }
    }

    pub fn epsilon(&self) -> Money {
        self.epsilon
    }

    pub fn plan(&self, balances: &BalanceMap) -> Result<SettlementPlan> {
        self.ensure_balanced(balances)?;

        let epsilon = self.epsilon.minor();

        let mut debtors: Vec<OpenBalance> = balances
            .iter()
            .filter(|p| p.is_debtor(self.epsilon))
            .map(|p| OpenBalance {
                member: &p.member,
                remaining: p.net.minor(),
            })
            .collect();
        let mut creditors: Vec<OpenBalance> = balances
            .iter()
            .filter(|p| p.is_creditor(self.epsilon))
            .map(|p| OpenBalance {
                member: &p.member,
                remaining: p.net.minor(),
            })
            .collect();

        // Stable sorts keep group order among equal balances.
        debtors.sort_by(|a, b| a.remaining.cmp(&b.remaining));
        creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
        for debtor in &mut debtors {
            debtor.remaining = debtor.remaining.saturating_abs();
        }

        let open_balances = debtors.len() + creditors.len();
        let mut settlements = Vec::with_capacity(open_balances.saturating_sub(1));
        let (mut d, mut c) = (0, 0);

        while d < debtors.len() && c < creditors.len() {
            let amount = debtors[d].remaining.min(creditors[c].remaining);

            if amount > epsilon {
                settlements.push(Settlement::new(
                    debtors[d].member.clone(),
                    creditors[c].member.clone(),
                    Money::from_minor(amount),
                ));
            }

            debtors[d].remaining -= amount;
            creditors[c].remaining -= amount;

            if debtors[d].remaining <= epsilon {
                d += 1;
            }
            if creditors[c].remaining <= epsilon {
                c += 1;
            }
        }

        let plan = SettlementPlan::new(settlements);
        get_metrics().record_settlement_plan(open_balances, plan.len());
        tracing::debug!(
            open_balances,
            settlements = plan.len(),
            volume = ?plan.volume(),
            "Settlement plan computed"
        );

        Ok(plan)
    }

    /// Refuses maps whose total is outside the ledger tolerance.
    fn ensure_balanced(&self, balances: &BalanceMap) -> Result<()> {
        let total: i128 = balances.iter().map(|p| i128::from(p.net.minor())).sum();
        if total.unsigned_abs() > u128::from(self.ledger_tolerance.minor().unsigned_abs()) {
            let clamped = total.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
            let err = EngineError::UnbalancedLedger(Money::from_minor(clamped));
            get_metrics().record_rejection("plan", err.code());
            tracing::warn!(members = balances.len(), "Refusing to plan: {}", err);
            return Err(err);
        }
        Ok(())
    }
}
