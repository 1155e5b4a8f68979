//! Response DTOs
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `GET /admin/cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub expired_removed: u64,
    pub evictions: u64,
    /// Live entries at the time of the request
    pub key_count: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            invalidations: stats.invalidations,
            expired_removed: stats.expired_removed,
            evictions: stats.evictions,
            key_count: stats.key_count,
        }
    }
}

/// Response body for `GET /admin/cache/entry`
#[derive(Debug, Clone, Serialize)]
pub struct HasKeyResponse {
    pub key: String,
    pub exists: bool,
    /// Remaining lifetime of a fresh entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_remaining_ms: Option<u64>,
}

/// Response body for `DELETE /admin/cache/entry`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    /// False when nothing was stored under the key
    pub invalidated: bool,
}

/// Response body for `DELETE /admin/cache`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateAllResponse {
    pub cleared: usize,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A reader's progress through one course.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "courseId")]
    pub course_id: String,
    pub completed: Vec<String>,
    /// RFC 3339 time of the last update, absent before the first one
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
