//! Response Cache - key-scoped TTL response caching for the textbook read API
//!
//! Requests are fingerprinted by route class, path, canonical query and (for
//! user-scoped routes) the authenticated user, then answered from an
//! in-memory store until their class TTL runs out or they are invalidated.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use service::ResponseCache;
pub use tasks::spawn_cleanup_task;
