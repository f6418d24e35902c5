use crate::config::EngineSettings;
use crate::error::{EngineError, Result};
use crate::models::{BalanceMap, Expense, LedgerSummary, Member, SettlementPlan};
use crate::observability::{get_metrics, LatencyTimer};
use crate::services::{BalanceAggregator, SettlementPlanner, SplitAllocator};
use serde::{Deserialize, Serialize};

/// Derived state of a group: who is owed what, and how to square up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLedger {
    pub balances: BalanceMap,
    pub settlements: SettlementPlan,
}

/// Single entry point for computing a group's ledger.
///
/// Holds only configuration. Each call is a pure function of its inputs, so
/// one engine can be shared freely between threads and groups.
#[derive(Debug, Clone, Default)]
pub struct LedgerEngine {
    allocator: SplitAllocator,
    aggregator: BalanceAggregator,
    planner: SettlementPlanner,
}

impl LedgerEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            planner: SettlementPlanner::new(&settings),
            aggregator: BalanceAggregator::new(),
            allocator: SplitAllocator::new(settings),
        }
    }

    /// Allocator configured with the same tolerances, for write-time use.
    pub fn allocator(&self) -> &SplitAllocator {
        &self.allocator
    }

    pub fn aggregator(&self) -> &BalanceAggregator {
        &self.aggregator
    }

    pub fn planner(&self) -> &SettlementPlanner {
        &self.planner
    }

    /// Aggregates `expenses` over `members` and plans the settlements.
    pub fn compute_group_ledger(&self, members: &[Member], expenses: &[Expense]) -> Result<GroupLedger> {
        let timer = LatencyTimer::new();
        let span = tracing::debug_span!("compute_group_ledger", members = members.len(), expenses = expenses.len());
        let _guard = span.enter();

        let balances = self.aggregator.aggregate(members, expenses)?;
        let settlements = self.planner.plan(&balances)?;

        let metrics = get_metrics();
        metrics.record_ledger_computed(members.len(), expenses.len());
        metrics.record_ledger_latency(timer.elapsed_ms());

        Ok(GroupLedger { balances, settlements })
    }

    /// Tolerances shared by the allocator and the planner.
    pub fn settings(&self) -> &EngineSettings {
        self.allocator.settings()
    }

    pub fn summarize(&self, ledger: &GroupLedger) -> Result<LedgerSummary> {
        LedgerSummary::from_ledger(&ledger.balances, &ledger.settlements, self.planner.epsilon())
            .ok_or_else(|| EngineError::InvalidExpense("ledger totals overflow".to_string()))
    }
}

/// Computes a ledger with default tolerances.
pub fn compute_group_ledger(members: &[Member], expenses: &[Expense]) -> Result<GroupLedger> {
    LedgerEngine::default().compute_group_ledger(members, expenses)
}
