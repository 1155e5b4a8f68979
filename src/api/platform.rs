//! Platform read API
//!
//! The downstream handlers the response cache sits in front of: chapter
//! content served from disk and per-user reading progress. Progress writes
//! invalidate the matching cached read explicitly; nothing else does.

use std::collections::HashMap;
use std::io::ErrorKind;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::Value;
use tracing::debug;

use super::AppState;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::{ProgressQuery, ProgressResponse, ProgressUpdate};
use crate::policy::{canonical_pairs, fingerprint, is_placeholder_identity, RouteClass};

/// Route serving per-user progress.
pub const PROGRESS_PATH: &str = "/api/user/progress";

// == Progress Book ==
#[derive(Debug, Clone)]
struct ProgressRecord {
    completed: Vec<String>,
    updated_at: String,
}

/// In-memory reading progress, keyed by (user, course).
#[derive(Debug, Default)]
pub struct ProgressBook {
    records: HashMap<(String, String), ProgressRecord>,
}

impl ProgressBook {
    pub fn get(&self, user_id: &str, course_id: &str) -> ProgressResponse {
        let record = self
            .records
            .get(&(user_id.to_string(), course_id.to_string()));

        ProgressResponse {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            completed: record.map(|r| r.completed.clone()).unwrap_or_default(),
            updated_at: record.map(|r| r.updated_at.clone()),
        }
    }

    pub fn update(&mut self, user_id: &str, course_id: &str, completed: Vec<String>) -> ProgressResponse {
        let record = ProgressRecord {
            completed,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        self.records
            .insert((user_id.to_string(), course_id.to_string()), record);
        self.get(user_id, course_id)
    }
}

/// Handler for GET /api/content/:slug
///
/// Loads `<content_dir>/<slug>.json`.
pub async fn content_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    if !is_valid_slug(&slug) {
        return Err(AppError::InvalidRequest(format!("Invalid content slug '{}'", slug)));
    }

    let path = state.content_dir.join(format!("{}.json", slug));
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("content '{}'", slug)));
        }
        Err(err) => {
            return Err(AppError::Internal(format!("reading content '{}': {}", slug, err)));
        }
    };

    let document: Value = serde_json::from_slice(&bytes)
        .map_err(|err| AppError::Internal(format!("content '{}' is not valid JSON: {}", slug, err)))?;

    Ok(Json(document))
}

/// Handler for GET /api/user/progress?courseId=
pub async fn get_progress_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>> {
    let user_id = require_user(user)?;
    let progress = state.progress.read().await.get(&user_id, &query.course_id);
    Ok(Json(progress))
}

/// Handler for PUT /api/user/progress
///
/// Drops the cached `GET ?courseId=` response of this user so the next read
/// sees the update.
pub async fn put_progress_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<ProgressResponse>> {
    let user_id = require_user(user)?;
    if let Some(error_msg) = update.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let progress = state
        .progress
        .write()
        .await
        .update(&user_id, &update.course_id, update.completed);

    let key = progress_key(&user_id, &update.course_id);
    let invalidated = state.cache.invalidate(&key).await;
    debug!(key = %key, invalidated, "progress cache entry invalidated");

    Ok(Json(progress))
}

/// Fingerprint of `GET /api/user/progress?courseId=<course_id>` for `user_id`.
pub fn progress_key(user_id: &str, course_id: &str) -> String {
    let query = canonical_pairs([("courseId".to_string(), course_id.to_string())]);
    fingerprint(RouteClass::UserProgress, PROGRESS_PATH, &query, Some(user_id))
}

fn require_user(user: Option<Extension<AuthenticatedUser>>) -> Result<String> {
    match user {
        Some(Extension(user)) if !is_placeholder_identity(user.id()) => Ok(user.0),
        _ => Err(AppError::Unauthorized("sign in to track progress".to_string())),
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
