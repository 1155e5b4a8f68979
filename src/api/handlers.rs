//! API Handlers
//!
//! Shared application state plus the operator-facing cache endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tokio::sync::RwLock;
use tracing::info;

use super::platform::ProgressBook;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    HasKeyResponse, HealthResponse, InvalidateAllResponse, InvalidateResponse, KeyQuery,
    StatsResponse,
};
use crate::service::ResponseCache;

/// Application state shared across all handlers.
///
/// Constructed once at startup and torn down with the server.
#[derive(Clone)]
pub struct AppState {
    pub cache: ResponseCache,
    /// Directory of chapter JSON documents
    pub content_dir: Arc<PathBuf>,
    /// Per-user reading progress
    pub progress: Arc<RwLock<ProgressBook>>,
}

impl AppState {
    pub fn new(cache: ResponseCache, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            content_dir: Arc::new(content_dir.into()),
            progress: Arc::new(RwLock::new(ProgressBook::default())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ResponseCache::from_config(config), config.content_dir.clone())
    }
}

/// Handler for GET /admin/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /admin/cache/entry?key=
pub async fn has_key_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<HasKeyResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let ttl_remaining_ms = state.cache.ttl_remaining_ms(&query.key).await;
    Ok(Json(HasKeyResponse {
        key: query.key,
        exists: ttl_remaining_ms.is_some(),
        ttl_remaining_ms,
    }))
}

/// Handler for DELETE /admin/cache/entry?key=
///
/// Unknown keys are reported with `invalidated: false`, not as an error.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let invalidated = state.cache.invalidate(&query.key).await;
    info!(key = %query.key, invalidated, "cache entry invalidated by operator");

    Ok(Json(InvalidateResponse {
        key: query.key,
        invalidated,
    }))
}

/// Handler for DELETE /admin/cache
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateAllResponse> {
    let cleared = state.cache.invalidate_all().await;
    info!(cleared, "response cache cleared by operator");
    Json(InvalidateAllResponse { cleared })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
