//! Link entity representing a shortened URL replicated across backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort page preview metadata captured when a link is created.
///
/// All fields are optional and immutable once set. Document backends store
/// this structure nested; relational backends serialize it into a JSON text
/// column (see [`crate::infrastructure::persistence`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl PreviewMetadata {
    /// Returns true when no preview field is populated.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.site_name.is_none()
    }
}

/// A short link with its target URL and click counter.
///
/// `short_code` is the sole lookup key. Once created, `original_url`,
/// `short_code`, `creator_ip` and `created_at` are immutable; only `clicks`
/// changes, and only by increment. The record is written to one backend at
/// creation time and may later be read back from any backend that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Absolute URL the short code redirects to.
    pub original_url: String,

    /// Unique lookup key. Uniqueness is enforced per backend, not across them.
    pub short_code: String,

    /// IP of the creator, kept only for rate-limit counting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_ip: Option<String>,

    #[serde(default)]
    pub preview: PreviewMetadata,

    pub created_at: DateTime<Utc>,

    /// Monotonically non-decreasing redirect counter.
    pub clicks: i64,
}

impl LinkRecord {
    /// Creates a fresh record with `created_at = now` and zero clicks.
    pub fn new(
        original_url: String,
        short_code: String,
        creator_ip: Option<String>,
        preview: PreviewMetadata,
    ) -> Self {
        Self {
            original_url,
            short_code,
            creator_ip,
            preview,
            created_at: Utc::now(),
            clicks: 0,
        }
    }
}
