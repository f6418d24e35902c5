use anyhow::Context;
use serde::{Deserialize, Serialize};
use splitledger::cache::LedgerCache;
use splitledger::config::Settings;
use splitledger::models::{BalanceMap, Expense, ExpenseDraft, Group, LedgerSummary, SettlementPlan};
use splitledger::observability::{init_logging, init_metrics, LogConfig};
use splitledger::LedgerEngine;
use std::io::Read;
use tracing::info;

/// Point-in-time read of one group. Drafts are allocated before the
/// ledger is computed.
#[derive(Debug, Deserialize)]
struct Snapshot {
    group: Group,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    drafts: Vec<ExpenseDraft>,
}

#[derive(Debug, Serialize)]
struct LedgerReport<'a> {
    group: &'a str,
    balances: &'a BalanceMap,
    settlements: &'a SettlementPlan,
    summary: LedgerSummary,
}

fn read_snapshot(path: Option<&str>) -> anyhow::Result<Snapshot> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading snapshot from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing snapshot")
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading configuration")?;
    init_logging(&LogConfig::from(&settings.logging));
    info!("Configuration loaded");

    let metrics_handle = if settings.metrics.enabled {
        Some(init_metrics().context("installing metrics recorder")?)
    } else {
        None
    };

    let path = std::env::args().nth(1);
    let snapshot = read_snapshot(path.as_deref())?;
    let members = snapshot.group.members();
    info!(
        group = %snapshot.group.name,
        members = members.len(),
        expenses = snapshot.expenses.len(),
        drafts = snapshot.drafts.len(),
        "Snapshot loaded"
    );

    let engine = LedgerEngine::new(settings.engine.clone());
    let mut expenses = snapshot.expenses.clone();
    for draft in snapshot.drafts {
        let description = draft.description.clone();
        let expense = engine
            .allocator()
            .record_expense(draft, members)
            .with_context(|| format!("allocating expense '{}'", description))?;
        expenses.push(expense);
    }

    let cache = LedgerCache::new(settings.cache.clone());
    let ledger = cache
        .get_or_compute(&engine, members, &expenses)
        .context("computing group ledger")?;

    let report = LedgerReport {
        group: &snapshot.group.name,
        balances: &ledger.balances,
        settlements: &ledger.settlements,
        summary: engine.summarize(&ledger).context("summarizing ledger")?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(settlements = ledger.settlements.len(), "Ledger computed");
    if let Some(handle) = metrics_handle {
        tracing::debug!("Metrics snapshot:\n{}", handle.render());
    }

    Ok(())
}
