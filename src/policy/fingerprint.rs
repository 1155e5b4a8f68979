//! Request fingerprinting.
//!
//! A fingerprint is the route-class prefix, the raw path and a canonical
//! JSON rendering of the query string. Query parameters are sorted by name
//! (then value) so equivalent requests with reordered parameters share a key.

use std::collections::BTreeMap;

use axum::extract::Query;
use axum::http::Uri;
use serde_json::{Map, Value};

use super::RouteClass;

/// Identities that stand for "nobody in particular". Responses for these
/// are never cached under a user scope.
const PLACEHOLDER_IDENTITIES: &[&str] = &["anonymous", "unknown", "guest", "undefined", "null"];

/// Renders the query string of `uri` as a compact, sorted JSON object.
///
/// Returns `None` when the query cannot be decoded, which callers treat as
/// "do not cache".
pub fn canonical_query(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    Some(canonical_pairs(pairs))
}

/// Canonical JSON form of decoded query pairs.
///
/// A name seen once maps to its value, a repeated name maps to an array of
/// its values in sorted order.
pub fn canonical_pairs<I>(pairs: I) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in pairs {
        grouped.entry(name).or_default().push(value);
    }

    let mut object = Map::new();
    for (name, mut values) in grouped {
        values.sort();
        let rendered = if values.len() == 1 {
            Value::String(values.remove(0))
        } else {
            Value::Array(values.into_iter().map(Value::String).collect())
        };
        object.insert(name, rendered);
    }

    Value::Object(object).to_string()
}

/// Builds the cache key for a request of the given class.
///
/// `user` is only folded in for user-scoped classes.
pub fn fingerprint(class: RouteClass, path: &str, canonical_query: &str, user: Option<&str>) -> String {
    match (class, user) {
        (RouteClass::UserProgress, Some(user)) => {
            format!("{}{}:{}?{}", class.key_prefix(), user, path, canonical_query)
        }
        _ => format!("{}{}?{}", class.key_prefix(), path, canonical_query),
    }
}

/// Whether `identity` is missing in all but name.
pub fn is_placeholder_identity(identity: &str) -> bool {
    let trimmed = identity.trim();
    trimmed.is_empty()
        || PLACEHOLDER_IDENTITIES
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
}
