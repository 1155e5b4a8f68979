//! API Routes
//!
//! Configures the Axum router: the cached platform API and the uncached
//! operator endpoints.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    has_key_handler, health_handler, invalidate_all_handler, invalidate_handler, stats_handler,
    AppState,
};
use super::platform::{content_handler, get_progress_handler, put_progress_handler, PROGRESS_PATH};
use crate::middleware::{cache_layer, identity_from_header};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/content/:slug` - Chapter document (cached, content class)
/// - `GET /api/user/progress?courseId=` - Reader progress (cached per user)
/// - `PUT /api/user/progress` - Update progress, invalidates the cached read
/// - `GET /admin/cache/stats` - Cache counters
/// - `GET /admin/cache/entry?key=` - Has-key check
/// - `DELETE /admin/cache/entry?key=` - Invalidate one entry
/// - `DELETE /admin/cache` - Invalidate everything
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Identity: `X-User-Id` header to `AuthenticatedUser`, outside the cache layer
/// - Cache: wraps the `/api` routes only
/// - CORS and request tracing on everything
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let platform = Router::new()
        .route("/api/content/:slug", get(content_handler))
        .route(PROGRESS_PATH, get(get_progress_handler).put(put_progress_handler))
        .layer(middleware::from_fn_with_state(state.cache.clone(), cache_layer));

    let admin = Router::new()
        .route("/admin/cache/stats", get(stats_handler))
        .route("/admin/cache/entry", get(has_key_handler).delete(invalidate_handler))
        .route("/admin/cache", delete(invalidate_all_handler))
        .route("/health", get(health_handler));

    platform
        .merge(admin)
        .layer(middleware::from_fn(identity_from_header))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-cache").is_none());
    }

    #[tokio::test]
    async fn test_stats_endpoint_is_not_cached() {
        let app = create_test_app();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/admin/cache/stats")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get("x-cache").is_none());
        }
    }

    #[tokio::test]
    async fn test_invalidate_all_endpoint() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/admin/cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_progress_without_identity_is_unauthorized() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/user/progress?courseId=7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
