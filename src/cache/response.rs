//! Cached Response Module
//!
//! The payload the store keeps: the handler's body bytes exactly as sent,
//! plus the representation headers replayed on a hit.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Handler headers that travel with a cached body.
pub const REPLAYED_HEADERS: [HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CONTENT_LANGUAGE,
    header::ETAG,
    header::LAST_MODIFIED,
    header::VARY,
];

// == Cached Response ==
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    /// Keeps `body` untouched and the [`REPLAYED_HEADERS`] found in `headers`.
    pub fn capture(headers: &HeaderMap, body: Bytes) -> Self {
        let mut kept = HeaderMap::new();
        for name in REPLAYED_HEADERS.iter() {
            for value in headers.get_all(name) {
                kept.append(name.clone(), value.clone());
            }
        }
        Self {
            headers: kept,
            body,
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl From<Value> for CachedResponse {
    fn from(value: Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            headers,
            body: Bytes::from(value.to_string()),
        }
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_capture_keeps_representation_headers_only() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"v1\""));
        headers.append(header::VARY, HeaderValue::from_static("accept"));
        headers.append(header::VARY, HeaderValue::from_static("accept-language"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("session=abc"));

        let cached = CachedResponse::capture(&headers, Bytes::from_static(b"{}"));

        assert_eq!(cached.headers()[header::CONTENT_TYPE], "application/problem+json");
        assert_eq!(cached.headers()[header::ETAG], "\"v1\"");
        assert_eq!(cached.headers().get_all(header::VARY).iter().count(), 2);
        assert!(cached.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_from_value_is_json() {
        let cached = CachedResponse::from(json!({"id": 1}));
        assert_eq!(cached.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(&cached.body()[..], br#"{"id":1}"#);
    }

    #[tokio::test]
    async fn test_into_response_replays_bytes_verbatim() {
        let raw = r#"{"title":"Chest","id":12345678901234567890123,"dose":0.10}"#;
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = CachedResponse::capture(&headers, Bytes::from_static(raw.as_bytes()))
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], raw.as_bytes());
    }
}
