//! Cache Module
//!
//! In-memory response store with per-entry TTL expiration, explicit
//! invalidation and an optional LRU bound.

mod entry;
mod lru;
mod response;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use response::{CachedResponse, REPLAYED_HEADERS};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default upper bound on a response body the cache will hold, in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
