//! Expiry Sweep Task
//!
//! Reads already treat expired entries as misses; this task reclaims their
//! memory on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically removes expired responses.
///
/// The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = ResponseCache::from_config(&config);
/// let sweep = spawn_cleanup_task(cache.store(), config.cleanup_interval);
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired responses", removed);
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}
