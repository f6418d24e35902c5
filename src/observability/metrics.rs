use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the ledger engine.
///
/// Without an installed recorder every call is a no-op, so library users
/// pay nothing unless the binary calls [`init_metrics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_allocation(&self, policy: &str, member_count: usize) {
        counter!("splitledger_allocations_total", "policy" => policy.to_string()).increment(1);
        histogram!("splitledger_allocation_member_count").record(member_count as f64);
    }

    pub fn record_rejection(&self, stage: &str, code: &str) {
        counter!("splitledger_rejections_total", "stage" => stage.to_string(), "code" => code.to_string()).increment(1);
    }

    pub fn record_ledger_computed(&self, member_count: usize, expense_count: usize) {
        counter!("splitledger_ledgers_computed_total").increment(1);
        histogram!("splitledger_ledger_member_count").record(member_count as f64);
        histogram!("splitledger_ledger_expense_count").record(expense_count as f64);
    }

    pub fn record_settlement_plan(&self, open_balances: usize, settlements: usize) {
        histogram!("splitledger_plan_open_balances").record(open_balances as f64);
        histogram!("splitledger_plan_settlement_count").record(settlements as f64);
    }

    pub fn record_ledger_latency(&self, duration_ms: f64) {
        histogram!("splitledger_ledger_duration_ms").record(duration_ms);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        counter!("splitledger_cache_lookups_total", "hit" => hit.to_string()).increment(1);
    }

    pub fn record_cache_eviction(&self) {
        counter!("splitledger_cache_evictions_total").increment(1);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the Prometheus recorder and returns its handle. Later calls
/// return the handle installed by the first one.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    METRICS.get_or_init(Metrics::new);

    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

/// Describes all metrics for Prometheus.
fn describe_metrics() {
    describe_counter!("splitledger_allocations_total", Unit::Count, "Expense allocations computed, by split policy");
    describe_histogram!("splitledger_allocation_member_count", Unit::Count, "Members covered per allocation");
    describe_counter!("splitledger_rejections_total", Unit::Count, "Inputs rejected by the engine, by stage and error code");

    describe_counter!("splitledger_ledgers_computed_total", Unit::Count, "Group ledgers computed");
    describe_histogram!("splitledger_ledger_member_count", Unit::Count, "Members per computed ledger");
    describe_histogram!("splitledger_ledger_expense_count", Unit::Count, "Expenses per computed ledger");
    describe_histogram!("splitledger_ledger_duration_ms", Unit::Milliseconds, "Ledger computation latency in milliseconds");

    describe_histogram!("splitledger_plan_open_balances", Unit::Count, "Non-zero balances entering the planner");
    describe_histogram!("splitledger_plan_settlement_count", Unit::Count, "Settlements emitted per plan");

    describe_counter!("splitledger_cache_lookups_total", Unit::Count, "Ledger cache lookups, by hit");
    describe_counter!("splitledger_cache_evictions_total", Unit::Count, "Ledger cache evictions");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}
