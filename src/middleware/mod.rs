//! Middleware Module
//!
//! Request identity extraction and the response caching layer.

mod cache;
mod identity;

pub use cache::{cache_layer, CacheStatus, X_CACHE};
pub use identity::{identity_from_header, AuthenticatedUser, USER_ID_HEADER};
