//! Cache Store Module
//!
//! Fingerprint-keyed response store with per-entry TTL, lazy expiry and an
//! optional LRU size bound.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, CachedResponse, LruTracker};

// == Cache Store ==
/// In-memory response store.
///
/// Reads never remove entries: an expired entry answers as a miss until the
/// sweep ([`cleanup_expired`](Self::cleanup_expired)) or an overwrite drops it.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    /// Recency order, only maintained when `max_entries` is set
    lru: LruTracker,
    stats: CacheStats,
    max_entries: Option<usize>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: None,
        }
    }

    /// Creates a store that evicts the least recently used entry once
    /// `max_entries` keys are held. A bound of zero means unbounded.
    pub fn with_max_entries(max_entries: usize) -> Self {
        let mut store = Self::new();
        store.max_entries = (max_entries > 0).then_some(max_entries);
        store
    }

    // == Get ==
    /// Returns the stored value when present and fresh, `None` otherwise.
    pub fn get(&mut self, key: &str) -> Option<CachedResponse> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                if self.max_entries.is_some() {
                    self.lru.touch(key);
                }
                Some(value)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry and
    /// restarting its expiry clock.
    pub fn set(&mut self, key: String, value: impl Into<CachedResponse>, ttl_seconds: u64) {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                self.evict_one();
            }
            self.lru.touch(&key);
        }

        self.entries.insert(key, CacheEntry::new(value.into(), ttl_seconds));
        self.stats.record_set();
    }

    // == Has ==
    /// Existence check honoring expiry. Counters are left untouched.
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remaining lifetime of a fresh entry in milliseconds, `None` when the
    /// key is absent or expired.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining_ms)
    }

    // == Invalidate ==
    /// Removes one entry, returning whether it was stored.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_invalidations(1);
            true
        } else {
            false
        }
    }

    // == Invalidate All ==
    /// Drops every entry and returns how many were held.
    pub fn invalidate_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.record_invalidations(count);
        count
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let now = current_timestamp_ms();
        let live = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count();

        let mut stats = self.stats.clone();
        stats.set_key_count(live);
        stats
    }

    // == Cleanup Expired ==
    /// Physically removes expired entries, returning how many went away.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expired(expired_keys.len());
        expired_keys.len()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    fn evict_one(&mut self) {
        if let Some(oldest) = self.lru.evict_oldest() {
            self.entries.remove(&oldest);
            self.stats.record_eviction();
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
