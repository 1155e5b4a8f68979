//! Response Cache Service
//!
//! The explicitly constructed cache instance handed to the router: the
//! shared store, the route policy that feeds it and the storage limits.
//! Built once at startup from [`Config`] and cloned into every layer that
//! needs it.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore, CachedResponse};
use crate::config::Config;
use crate::policy::RoutePolicy;

#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<RwLock<CacheStore>>,
    policy: Arc<RoutePolicy>,
    max_value_size: usize,
}

impl ResponseCache {
    pub fn new(store: CacheStore, policy: RoutePolicy, max_value_size: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            policy: Arc::new(policy),
            max_value_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheStore::with_max_entries(config.max_entries),
            RoutePolicy::from_config(config),
            config.max_value_size,
        )
    }

    /// Shared handle to the underlying store, used by the expiry sweep.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    // Lookups update hit/miss counters, hence the write lock.
    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.store.write().await.get(key)
    }

    pub async fn set(&self, key: String, value: impl Into<CachedResponse>, ttl_seconds: u64) {
        self.store.write().await.set(key, value, ttl_seconds);
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.read().await.has(key)
    }

    pub async fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.store.read().await.ttl_remaining_ms(key)
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.store.write().await.invalidate(key)
    }

    pub async fn invalidate_all(&self) -> usize {
        self.store.write().await.invalidate_all()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}
