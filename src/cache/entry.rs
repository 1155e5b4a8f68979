//! Cache Entry Module
//!
//! Defines a single cached response body with its expiration window.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::CachedResponse;

// == Cache Entry ==
/// A cached response body plus the metadata needed to expire it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached response payload
    pub value: CachedResponse,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration window in seconds, decided by the route class at write time
    pub ttl_seconds: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: CachedResponse, ttl_seconds: u64) -> Self {
        Self {
            value,
            created_at: current_timestamp_ms(),
            ttl_seconds,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is expired once `now - created_at >= ttl`,
    /// so a TTL of zero yields an entry that is never readable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) >= self.ttl_seconds.saturating_mul(1000)
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let age = current_timestamp_ms().saturating_sub(self.created_at);
        self.ttl_seconds.saturating_mul(1000).saturating_sub(age)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
