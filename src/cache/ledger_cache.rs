use crate::config::{CacheSettings, EngineSettings};
use crate::error::Result;
use crate::models::{Expense, Member};
use crate::observability::get_metrics;
use crate::services::{GroupLedger, LedgerEngine};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Cache statistics for monitoring.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub invalidations: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn get_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn get_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn get_invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    pub fn get_evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

/// Content fingerprint of a ledger snapshot: SHA-256 over the canonical JSON
/// of the engine tolerances, the member list and the expense set, hex encoded.
///
/// Any mutation of the snapshot (new, edited or deleted expense, renamed
/// member) changes the fingerprint, so stale entries are never served. Engines
/// with different tolerances never share an entry.
pub fn fingerprint(settings: &EngineSettings, members: &[Member], expenses: &[Expense]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(b"ledger|engine:");
    hasher.update(serde_json::to_vec(settings)?);
    hasher.update(b"|members:");
    hasher.update(serde_json::to_vec(members)?);
    hasher.update(b"|expenses:");
    hasher.update(serde_json::to_vec(expenses)?);
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, GroupLedger>,
    order: VecDeque<String>,
}

/// In-process cache of computed ledgers keyed by snapshot fingerprint.
///
/// Ledgers stay derived data: a hit returns exactly what recomputation would,
/// because the key covers the whole snapshot.
pub struct LedgerCache {
    settings: CacheSettings,
    state: RwLock<CacheState>,
    stats: Arc<CacheStats>,
}

impl LedgerCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            state: RwLock::new(CacheState::default()),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> Arc<CacheStats> {
        self.stats.clone()
    }

    /// Gets a ledger from cache.
    pub fn get(&self, key: &str) -> Option<GroupLedger> {
        if !self.settings.enabled {
            return None;
        }

        let cached = match self.state.read() {
            Ok(state) => state.entries.get(key).cloned(),
            Err(e) => {
                tracing::warn!("Ledger cache lock poisoned on get: {}", e);
                None
            }
        };

        match cached {
            Some(ledger) => {
                self.stats.record_hit();
                get_metrics().record_cache_lookup(true);
                tracing::debug!(key = %key, "Cache hit for ledger");
                Some(ledger)
            }
            None => {
                self.stats.record_miss();
                get_metrics().record_cache_lookup(false);
                None
            }
        }
    }

    /// Stores a ledger, evicting the oldest entries past `max_entries`.
    pub fn insert(&self, key: String, ledger: GroupLedger) {
        if !self.settings.enabled || self.settings.max_entries == 0 {
            return;
        }

        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ledger cache lock poisoned on insert: {}", e);
                return;
            }
        };

        if state.entries.insert(key.clone(), ledger).is_none() {
            state.order.push_back(key);
        }

        while state.entries.len() > self.settings.max_entries {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if state.entries.remove(&oldest).is_some() {
                self.stats.record_eviction();
                get_metrics().record_cache_eviction();
                tracing::debug!(key = %oldest, "Evicted cached ledger");
            }
        }
    }

    /// Invalidates a cached ledger.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut state) = self.state.write() {
            if state.entries.remove(key).is_some() {
                state.order.retain(|k| k != key);
                self.stats.record_invalidation();
                tracing::debug!(key = %key, "Invalidated cached ledger");
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            let count = state.entries.len();
            state.entries.clear();
            state.order.clear();
            tracing::debug!(count, "Cleared ledger cache");
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached ledger for this snapshot, computing and storing it
    /// on a miss. Errors are never cached.
    pub fn get_or_compute(&self, engine: &LedgerEngine, members: &[Member], expenses: &[Expense]) -> Result<GroupLedger> {
        if !self.settings.enabled {
            return engine.compute_group_ledger(members, expenses);
        }

        let key = fingerprint(engine.settings(), members, expenses)?;
        if let Some(ledger) = self.get(&key) {
            return Ok(ledger);
        }

        let ledger = engine.compute_group_ledger(members, expenses)?;
        self.insert(key, ledger.clone());
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceMap, SettlementPlan};

    fn empty_ledger() -> GroupLedger {
        GroupLedger {
            balances: BalanceMap::default(),
            settlements: SettlementPlan::default(),
        }
    }

    #[test]
    fn test_cache_stats() {
        let stats = CacheStats::new();

        assert_eq!(stats.get_hits(), 0);
        assert_eq!(stats.get_misses(), 0);
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert_eq!(stats.get_hits(), 2);
        assert_eq!(stats.get_misses(), 1);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let members = vec![Member::new("a", "Alice"), Member::new("b", "Bob")];
        let settings = EngineSettings::default();
        let first = fingerprint(&settings, &members, &[]).unwrap();
        let second = fingerprint(&settings, &members, &[]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let renamed = vec![Member::new("a", "Alicia"), Member::new("b", "Bob")];
        assert_ne!(first, fingerprint(&settings, &renamed, &[]).unwrap());
    }

    #[test]
    fn test_fingerprint_covers_engine_settings() {
        let members = vec![Member::new("a", "Alice"), Member::new("b", "Bob")];
        let lenient = EngineSettings {
            settle_epsilon_minor: 100,
            ..EngineSettings::default()
        };

        assert_ne!(
            fingerprint(&EngineSettings::default(), &members, &[]).unwrap(),
            fingerprint(&lenient, &members, &[]).unwrap()
        );
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = LedgerCache::new(CacheSettings {
            enabled: true,
            max_entries: 2,
        });

        cache.insert("one".to_string(), empty_ledger());
        cache.insert("two".to_string(), empty_ledger());
        cache.insert("three".to_string(), empty_ledger());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("one").is_none());
        assert!(cache.get("three").is_some());
        assert_eq!(cache.stats().get_evictions(), 1);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = LedgerCache::new(CacheSettings {
            enabled: false,
            max_entries: 8,
        });
        cache.insert("key".to_string(), empty_ledger());
        assert!(cache.is_empty());
        assert!(cache.get("key").is_none());
        assert_eq!(cache.stats().get_misses(), 0);
    }
}
