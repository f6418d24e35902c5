pub mod balance_aggregator;
pub mod ledger_engine;
pub mod settlement_planner;
pub mod split_allocator;

pub use balance_aggregator::BalanceAggregator;
pub use ledger_engine::{compute_group_ledger, GroupLedger, LedgerEngine};
pub use settlement_planner::SettlementPlanner;
pub use split_allocator::SplitAllocator;
