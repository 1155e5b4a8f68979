//! Request DTOs
//!
//! Query strings and bodies accepted by the admin surface and the
//! progress endpoints.

use serde::Deserialize;

/// `?key=` query for the single-entry admin endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    /// Full cache fingerprint, e.g. `content:/api/content/chapter-1?{}`
    #[serde(default)]
    pub key: String,
}

impl KeyQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// `?courseId=` query for reading progress.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressQuery {
    #[serde(rename = "courseId")]
    pub course_id: String,
}

/// Body of `PUT /api/user/progress`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    #[serde(rename = "courseId")]
    pub course_id: String,
    /// Section identifiers the reader has finished
    #[serde(default)]
    pub completed: Vec<String>,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Option<String> {
        if self.course_id.trim().is_empty() {
            return Some("courseId cannot be empty".to_string());
        }
        None
    }
}
