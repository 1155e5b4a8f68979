//! Response caching middleware.
//!
//! Wraps the downstream handler: a fresh entry short-circuits the handler,
//! a miss runs it exactly once and keeps its JSON body for the class TTL.
//! Hits replay the captured bytes and representation headers verbatim.
//! Storage problems never fail the request; the response is served uncached.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::{stream, StreamExt};
use serde::de::IgnoredAny;
use tracing::{debug, warn};

use super::AuthenticatedUser;
use crate::cache::CachedResponse;
use crate::error::AppError;
use crate::policy::CacheDecision;
use crate::service::ResponseCache;

/// Response header reporting whether the cache answered the request.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Axum middleware, installed with `middleware::from_fn_with_state`.
pub async fn cache_layer(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.id().to_string());

    let Some(decision) = cache
        .policy()
        .decide(request.method(), request.uri(), user.as_deref())
    else {
        debug!(method = %request.method(), path = %request.uri().path(), "cache bypass");
        return next.run(request).await;
    };

    if let Some(cached) = cache.get(&decision.key).await {
        debug!(key = %decision.key, class = decision.class.as_str(), "cache hit");
        let mut response = cached.into_response();
        mark_response(&mut response, &decision, CacheStatus::Hit);
        return response;
    }

    debug!(key = %decision.key, class = decision.class.as_str(), "cache miss");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        let mut response = response;
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static(CacheStatus::Miss.as_str()));
        return response;
    }

    let (parts, body) = response.into_parts();
    let limit = cache.max_value_size();
    let body = match read_capped(body, limit).await {
        Ok(Captured::Complete(bytes)) => {
            store_body(&cache, &decision, &parts.headers, bytes.clone()).await;
            Body::from(bytes)
        }
        Ok(Captured::Oversized(body)) => {
            warn!(key = %decision.key, limit, "response too large to cache, serving uncached");
            body
        }
        Err(err) => {
            warn!(key = %decision.key, error = %err, "failed to read handler response body");
            return AppError::Internal("failed to read response body".to_string()).into_response();
        }
    };

    let mut response = Response::from_parts(parts, body);
    mark_response(&mut response, &decision, CacheStatus::Miss);
    response
}

/// A handler body read against the size limit.
enum Captured {
    Complete(Bytes),
    /// Chunks read so far chained in front of the unread remainder
    Oversized(Body),
}

/// Buffers at most `limit` bytes. Past that, the body is handed back as a
/// stream without reading the rest.
async fn read_capped(body: Body, limit: usize) -> Result<Captured, axum::Error> {
    if body.size_hint().lower() > limit as u64 {
        return Ok(Captured::Oversized(body));
    }

    let mut data = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut size = 0usize;

    while let Some(chunk) = data.next().await {
        let chunk = chunk?;
        size += chunk.len();
        chunks.push(chunk);

        if size > limit {
            let read = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>));
            return Ok(Captured::Oversized(Body::from_stream(read.chain(data))));
        }
    }

    Ok(Captured::Complete(Bytes::from(chunks.concat())))
}

/// Stores a captured body when it parses as JSON.
async fn store_body(
    cache: &ResponseCache,
    decision: &CacheDecision,
    headers: &HeaderMap,
    bytes: Bytes,
) {
    if let Err(err) = serde_json::from_slice::<IgnoredAny>(&bytes) {
        warn!(key = %decision.key, error = %err, "response body is not JSON, serving uncached");
        return;
    }

    cache
        .set(
            decision.key.clone(),
            CachedResponse::capture(headers, bytes),
            decision.ttl_seconds,
        )
        .await;
    debug!(key = %decision.key, ttl = decision.ttl_seconds, "response cached");
}

fn mark_response(response: &mut Response, decision: &CacheDecision, status: CacheStatus) {
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(status.as_str()));
    if let Ok(value) = HeaderValue::from_str(&decision.cache_control()) {
        headers.insert(header::CACHE_CONTROL, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        body::to_bytes,
        http::Request as HttpRequest,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::config::Config;
    use crate::middleware::identity_from_header;

    const RAW_BODY: &str = r#"{"title":"Chest","id":12345678901234567890123,"dose":0.10}"#;
    const STREAM_CHUNKS: [&str; 3] = ["[1,2,", "3,4,", "5]"];

    #[derive(Clone, Default)]
    struct Calls(Arc<AtomicUsize>);

    impl Calls {
        fn bump(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn app(cache: ResponseCache, calls: Calls) -> Router {
        let json_calls = calls.clone();
        let text_calls = calls.clone();
        let missing_calls = calls.clone();
        let post_calls = calls.clone();
        let raw_calls = calls.clone();
        let stream_calls = calls.clone();
        let user_calls = calls;

        Router::new()
            .route(
                "/api/content/:slug",
                get(move || {
                    let calls = json_calls.clone();
                    async move { Json(json!({ "call": calls.bump() })) }
                }),
            )
            .route(
                "/api/plain",
                get(move || {
                    let calls = text_calls.clone();
                    async move {
                        calls.bump();
                        "not json"
                    }
                }),
            )
            .route(
                "/api/missing",
                get(move || {
                    let calls = missing_calls.clone();
                    async move {
                        calls.bump();
                        StatusCode::NOT_FOUND
                    }
                }),
            )
            .route(
                "/api/echo",
                post(move || {
                    let calls = post_calls.clone();
                    async move { Json(json!({ "call": calls.bump() })) }
                }),
            )
            .route(
                "/api/raw",
                get(move || {
                    let calls = raw_calls.clone();
                    async move {
                        calls.bump();
                        (
                            [
                                (header::CONTENT_TYPE, "application/json; charset=utf-8"),
                                (header::ETAG, "\"v1\""),
                                (header::CONTENT_LANGUAGE, "en"),
                            ],
                            RAW_BODY,
                        )
                    }
                }),
            )
            .route(
                "/api/stream",
                get(move || {
                    let calls = stream_calls.clone();
                    async move {
                        calls.bump();
                        Body::from_stream(stream::iter(STREAM_CHUNKS.into_iter().map(|chunk| {
                            Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes()))
                        })))
                    }
                }),
            )
            .route(
                "/api/user/progress",
                get(move |user: Option<axum::Extension<AuthenticatedUser>>| {
                    let calls = user_calls.clone();
                    async move {
                        let who = user.map(|axum::Extension(u)| u.0).unwrap_or_default();
                        Json(json!({ "user": who, "call": calls.bump() }))
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(cache, cache_layer))
            .layer(axum::middleware::from_fn(identity_from_header))
    }

    async fn send(app: &Router, method: &str, uri: &str, user: Option<&str>) -> Response {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn x_cache(response: &Response) -> Option<&str> {
        response.headers().get(X_CACHE).and_then(|v| v.to_str().ok())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let first = send(&app, "GET", "/api/content/chapter-1", None).await;
        assert_eq!(x_cache(&first), Some("MISS"));
        assert_eq!(
            first.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=300"
        );
        assert_eq!(json_body(first).await["call"], 1);

        let second = send(&app, "GET", "/api/content/chapter-1", None).await;
        assert_eq!(x_cache(&second), Some("HIT"));
        assert_eq!(json_body(second).await["call"], 1);

        assert_eq!(calls.count(), 1);
        assert!(cache.has("content:/api/content/chapter-1?{}").await);
    }

    #[tokio::test]
    async fn test_reordered_query_shares_entry() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache, calls.clone());

        send(&app, "GET", "/api/content/ch?a=1&b=2", None).await;
        let second = send(&app, "GET", "/api/content/ch?b=2&a=1", None).await;

        assert_eq!(x_cache(&second), Some("HIT"));
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let first = send(&app, "POST", "/api/echo", None).await;
        let second = send(&app, "POST", "/api/echo", None).await;

        assert_eq!(x_cache(&first), None);
        assert_eq!(json_body(second).await["call"], 2);
        assert_eq!(cache.stats().await.sets, 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_served_uncached() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let first = send(&app, "GET", "/api/plain", None).await;
        assert_eq!(first.status(), StatusCode::OK);
        let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"not json");

        let second = send(&app, "GET", "/api/plain", None).await;
        assert_eq!(x_cache(&second), Some("MISS"));
        assert_eq!(calls.count(), 2);
        assert_eq!(cache.stats().await.key_count, 0);
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let first = send(&app, "GET", "/api/missing", None).await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);
        assert!(first.headers().get(header::CACHE_CONTROL).is_none());

        send(&app, "GET", "/api/missing", None).await;
        assert_eq!(calls.count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_body_is_served_uncached() {
        let config = Config {
            max_value_size: 4,
            ..Config::default()
        };
        let cache = ResponseCache::from_config(&config);
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        send(&app, "GET", "/api/content/big", None).await;
        let second = send(&app, "GET", "/api/content/big", None).await;

        assert_eq!(x_cache(&second), Some("MISS"));
        assert_eq!(json_body(second).await["call"], 2);
        assert_eq!(calls.count(), 2);
        assert_eq!(cache.stats().await.sets, 0);
    }

    #[tokio::test]
    async fn test_oversized_stream_passes_through_intact() {
        let config = Config {
            max_value_size: 6,
            ..Config::default()
        };
        let cache = ResponseCache::from_config(&config);
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        for _ in 0..2 {
            let response = send(&app, "GET", "/api/stream", None).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(x_cache(&response), Some("MISS"));
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], b"[1,2,3,4,5]");
        }

        assert_eq!(calls.count(), 2);
        assert_eq!(cache.stats().await.sets, 0);
    }

    #[tokio::test]
    async fn test_stream_within_limit_is_cached() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache, calls.clone());

        send(&app, "GET", "/api/stream", None).await;
        let hit = send(&app, "GET", "/api/stream", None).await;

        assert_eq!(x_cache(&hit), Some("HIT"));
        let bytes = to_bytes(hit.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"[1,2,3,4,5]");
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_hit_replays_body_bytes_and_headers_verbatim() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache, calls.clone());

        let miss = send(&app, "GET", "/api/raw", None).await;
        assert_eq!(x_cache(&miss), Some("MISS"));
        let miss_headers = miss.headers().clone();
        let miss_body = to_bytes(miss.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&miss_body[..], RAW_BODY.as_bytes());

        let hit = send(&app, "GET", "/api/raw", None).await;
        assert_eq!(x_cache(&hit), Some("HIT"));
        for name in [header::CONTENT_TYPE, header::ETAG, header::CONTENT_LANGUAGE] {
            assert_eq!(hit.headers().get(&name), miss_headers.get(&name), "{}", name);
        }
        let hit_body = to_bytes(hit.into_body(), usize::MAX).await.unwrap();
        assert_eq!(hit_body, miss_body);
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn test_user_scopes_are_isolated() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let u1 = send(&app, "GET", "/api/user/progress?courseId=7", Some("u1")).await;
        assert_eq!(
            u1.headers().get(header::CACHE_CONTROL).unwrap(),
            "private, max-age=120"
        );
        let u2 = send(&app, "GET", "/api/user/progress?courseId=7", Some("u2")).await;
        assert_eq!(x_cache(&u2), Some("MISS"));
        assert_eq!(json_body(u2).await["user"], "u2");

        let u1_again = send(&app, "GET", "/api/user/progress?courseId=7", Some("u1")).await;
        assert_eq!(x_cache(&u1_again), Some("HIT"));
        assert_eq!(json_body(u1_again).await["user"], "u1");
        assert_eq!(calls.count(), 2);
    }

    #[tokio::test]
    async fn test_progress_without_identity_is_never_cached() {
        let cache = ResponseCache::from_config(&Config::default());
        let calls = Calls::default();
        let app = app(cache.clone(), calls.clone());

        let first = send(&app, "GET", "/api/user/progress?courseId=7", None).await;
        assert_eq!(x_cache(&first), None);
        send(&app, "GET", "/api/user/progress?courseId=7", Some("anonymous")).await;

        assert_eq!(calls.count(), 2);
        assert_eq!(cache.stats().await.sets, 0);
    }
}
