//! Configuration Module
//!
//! Handles loading server and cache-policy configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::MAX_VALUE_SIZE;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for the generic route class
    pub default_ttl: u64,
    /// TTL in seconds for course content routes
    pub content_ttl: u64,
    /// TTL in seconds for per-user progress routes
    pub progress_ttl: u64,
    /// LRU bound on cached responses, 0 = unbounded
    pub max_entries: usize,
    /// Largest response body the cache will store, in bytes
    pub max_value_size: usize,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Path prefixes cached under the generic class
    pub generic_prefixes: Vec<String>,
    /// Directory holding chapter JSON documents
    pub content_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Generic route TTL in seconds (default: 600)
    /// - `CONTENT_TTL` - Content route TTL in seconds (default: 300)
    /// - `PROGRESS_TTL` - User progress TTL in seconds (default: 120)
    /// - `MAX_ENTRIES` - LRU bound, 0 disables it (default: 0)
    /// - `MAX_VALUE_SIZE` - Largest cacheable body in bytes (default: 1 MiB)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds, at least 1 (default: 30)
    /// - `GENERIC_PREFIXES` - Comma-separated prefixes (default: `/api`)
    /// - `CONTENT_DIR` - Chapter document directory (default: `content`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            content_ttl: env_or("CONTENT_TTL", defaults.content_ttl),
            progress_ttl: env_or("PROGRESS_TTL", defaults.progress_ttl),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_value_size: env_or("MAX_VALUE_SIZE", defaults.max_value_size),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval).max(1),
            generic_prefixes: env::var("GENERIC_PREFIXES")
                .ok()
                .map(|v| parse_prefixes(&v))
                .filter(|prefixes| !prefixes.is_empty())
                .unwrap_or(defaults.generic_prefixes),
            content_dir: env::var("CONTENT_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 600,
            content_ttl: 300,
            progress_ttl: 120,
            max_entries: 0,
            max_value_size: MAX_VALUE_SIZE,
            cleanup_interval: 30,
            generic_prefixes: vec!["/api".to_string()],
            content_dir: PathBuf::from("content"),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
