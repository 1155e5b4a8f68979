//! API Module
//!
//! HTTP handlers and routing.
//!
//! # Endpoints
//! - `GET /api/content/:slug` - Chapter content (cached)
//! - `GET|PUT /api/user/progress` - Reader progress (GET cached per user)
//! - `GET /admin/cache/stats` - Cache statistics
//! - `GET|DELETE /admin/cache/entry?key=` - Has-key / invalidate one
//! - `DELETE /admin/cache` - Invalidate all
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod platform;
pub mod routes;

pub use handlers::*;
pub use platform::{progress_key, ProgressBook, PROGRESS_PATH};
pub use routes::create_router;
