//! Route-class caching policy.
//!
//! Decides, before the generic cache is touched, whether a request is
//! cacheable, under which fingerprint and for how long.
//!
//! | Class         | Match                                   | TTL (default) | Visibility |
//! |---------------|-----------------------------------------|---------------|------------|
//! | user-progress | `progress` path segment, known identity | 120s          | private    |
//! | content       | content allow-list prefix               | 300s          | public     |
//! | generic       | configured generic prefix               | 600s          | public     |
//!
//! Only `GET` is eligible. Classes are tried in the order above.

pub mod fingerprint;

use axum::http::{Method, Uri};

use crate::config::Config;

pub use fingerprint::{canonical_pairs, canonical_query, fingerprint, is_placeholder_identity};

/// Path prefixes whose responses are course content shared by all readers.
pub const CONTENT_PREFIXES: &[&str] = &["/api/content", "/api/chapters", "/api/modules"];

/// Path segment marking per-user progress data.
pub const PROGRESS_MARKER: &str = "progress";

// == Route Class ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Generic,
    Content,
    UserProgress,
}

impl RouteClass {
    /// Prefix prepended to every fingerprint of this class.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            RouteClass::Generic => "",
            RouteClass::Content => "content:",
            RouteClass::UserProgress => "user_progress:",
        }
    }

    /// User-scoped responses must only be cached privately.
    pub fn is_user_scoped(&self) -> bool {
        matches!(self, RouteClass::UserProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Generic => "generic",
            RouteClass::Content => "content",
            RouteClass::UserProgress => "user_progress",
        }
    }
}

// == Cache Decision ==
/// Outcome of classifying a cacheable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDecision {
    pub class: RouteClass,
    pub key: String,
    pub ttl_seconds: u64,
}

impl CacheDecision {
    /// `Cache-Control` value mirroring the class TTL for intermediate caches.
    pub fn cache_control(&self) -> String {
        let visibility = if self.class.is_user_scoped() {
            "private"
        } else {
            "public"
        };
        format!("{}, max-age={}", visibility, self.ttl_seconds)
    }
}

// == Route Policy ==
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    generic_prefixes: Vec<String>,
    content_prefixes: Vec<String>,
    default_ttl: u64,
    content_ttl: u64,
    progress_ttl: u64,
}

impl RoutePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generic_prefixes: config
                .generic_prefixes
                .iter()
                .map(|p| normalize_prefix(p))
                .collect(),
            content_prefixes: CONTENT_PREFIXES.iter().map(|p| normalize_prefix(p)).collect(),
            default_ttl: config.default_ttl,
            content_ttl: config.content_ttl,
            progress_ttl: config.progress_ttl,
        }
    }

    pub fn ttl_for(&self, class: RouteClass) -> u64 {
        match class {
            RouteClass::Generic => self.default_ttl,
            RouteClass::Content => self.content_ttl,
            RouteClass::UserProgress => self.progress_ttl,
        }
    }

    // == Classify ==
    /// Maps a method and path onto a route class, `None` when never cached.
    pub fn classify(&self, method: &Method, path: &str) -> Option<RouteClass> {
        if *method != Method::GET {
            return None;
        }

        if path.split('/').any(|segment| segment == PROGRESS_MARKER) {
            Some(RouteClass::UserProgress)
        } else if self.content_prefixes.iter().any(|p| prefix_matches(p, path)) {
            Some(RouteClass::Content)
        } else if self.generic_prefixes.iter().any(|p| prefix_matches(p, path)) {
            Some(RouteClass::Generic)
        } else {
            None
        }
    }

    // == Decide ==
    /// Full decision for a request: class, fingerprint and TTL.
    ///
    /// User-scoped requests without a real identity, and requests whose query
    /// cannot be decoded, are not cached.
    pub fn decide(&self, method: &Method, uri: &Uri, user: Option<&str>) -> Option<CacheDecision> {
        let class = self.classify(method, uri.path())?;

        let user = user.filter(|id| !is_placeholder_identity(id));
        if class.is_user_scoped() && user.is_none() {
            return None;
        }

        let query = canonical_query(uri)?;
        Some(CacheDecision {
            class,
            key: fingerprint(class, uri.path(), &query, user),
            ttl_seconds: self.ttl_for(class),
        })
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_end_matches('/').to_string()
}

/// Prefix match on a path-segment boundary; an empty prefix matches all.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
