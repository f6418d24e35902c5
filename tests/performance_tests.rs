mod common;

use splitledger::cache::{CacheStats, LedgerCache};
use splitledger::config::CacheSettings;
use splitledger::models::{Expense, Money, Split};
use splitledger::observability::LatencyTimer;
use splitledger::LedgerEngine;
use std::time::Instant;

fn busy_group_expenses(engine: &LedgerEngine, count: usize) -> (splitledger::models::Group, Vec<Expense>) {
    let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let group = common::group(&ids);
    let expenses = (0..count)
        .map(|i| common::record(engine, &group, ids[i % ids.len()], Money::from_minor((i as i64 % 5000) + 101), Split::Equal))
        .collect();
    (group, expenses)
}

#[test]
fn test_cache_stats_concurrent_access() {
    use std::sync::Arc;
    use std::thread;

    let stats = Arc::new(CacheStats::new());
    let mut handles = vec![];

    for _ in 0..10 {
        let stats_clone = stats.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                stats_clone.record_hit();
                stats_clone.record_miss();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stats.get_hits(), 10000);
    assert_eq!(stats.get_misses(), 10000);
    assert!((stats.hit_rate() - 0.5).abs() < 0.01);
}

#[test]
fn test_cache_stats_hit_rate_edge_cases() {
    let stats = CacheStats::new();

    assert_eq!(stats.hit_rate(), 0.0);

    stats.record_hit();
    assert_eq!(stats.hit_rate(), 1.0);

    stats.record_miss();
    assert_eq!(stats.hit_rate(), 0.5);

    for _ in 0..98 {
        stats.record_hit();
    }
    assert!((stats.hit_rate() - 0.99).abs() < 0.01);
}

#[test]
fn test_ledger_computation_performance() {
    let engine = LedgerEngine::default();
    let (group, expenses) = busy_group_expenses(&engine, 1000);

    let start = Instant::now();
    let iterations = 100;

    for _ in 0..iterations {
        let ledger = engine.compute_group_ledger(group.members(), &expenses).unwrap();
        std::hint::black_box(ledger);
    }

    let elapsed = start.elapsed();
    let per_op_us = elapsed.as_micros() / iterations as u128;

    println!("Ledger over 1000 expenses: {} us/op", per_op_us);
    assert!(per_op_us < 50_000, "Ledger computation too slow: {} us/op", per_op_us);
}

#[test]
fn test_concurrent_ledgers_share_one_engine() {
    use std::sync::Arc;
    use std::thread;

    let engine = Arc::new(LedgerEngine::default());
    let (group, expenses) = busy_group_expenses(&engine, 200);
    let expected = engine.compute_group_ledger(group.members(), &expenses).unwrap();
    let inputs = Arc::new((group, expenses));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let inputs = inputs.clone();
            thread::spawn(move || engine.compute_group_ledger(inputs.0.members(), &inputs.1).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_cache_hit_returns_recomputed_ledger() {
    let engine = LedgerEngine::default();
    let (group, expenses) = busy_group_expenses(&engine, 50);
    let cache = LedgerCache::new(CacheSettings {
        enabled: true,
        max_entries: 4,
    });

    let timer = LatencyTimer::new();
    let first = cache.get_or_compute(&engine, group.members(), &expenses).unwrap();
    let second = cache.get_or_compute(&engine, group.members(), &expenses).unwrap();
    println!("Two cached lookups: {:.3} ms", timer.elapsed_ms());

    assert_eq!(first, second);
    assert_eq!(first, engine.compute_group_ledger(group.members(), &expenses).unwrap());
    assert_eq!(cache.stats().get_hits(), 1);
    assert_eq!(cache.stats().get_misses(), 1);
}
