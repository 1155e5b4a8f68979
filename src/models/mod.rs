//! Request and Response models
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{KeyQuery, ProgressQuery, ProgressUpdate};
pub use responses::{
    HasKeyResponse, HealthResponse, InvalidateAllResponse, InvalidateResponse, ProgressResponse,
    StatsResponse,
};
