//! Cache Statistics Module
//!
//! Observability counters for the response cache. Every counter only ever
//! grows; `key_count` is a snapshot filled in when stats are read.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing fresh
    pub misses: u64,
    /// Writes, including overwrites
    pub sets: u64,
    /// Entries removed through explicit invalidation
    pub invalidations: u64,
    /// Entries physically removed by the expiry sweep
    pub expired_removed: u64,
    /// Entries dropped by the size bound
    pub evictions: u64,
    /// Live (non-expired) entries at the time of the snapshot
    pub key_count: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired_removed += count as u64;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_key_count(&mut self, count: usize) {
        self.key_count = count;
    }
}
