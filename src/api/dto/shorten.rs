//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{LinkRecord, PreviewMetadata};

/// Request to shorten one URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be a valid absolute URL).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional custom short code; validated separately for length,
    /// characters, and reserved names.
    pub custom_code: Option<String>,

    /// Optional page preview supplied by the caller. The service stores it
    /// as-is; it never fetches the target page itself.
    #[validate(nested)]
    pub preview: Option<PreviewRequest>,
}

/// Preview fields accepted from the caller.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(length(max = 300))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 2000))]
    pub image: Option<String>,

    #[validate(length(max = 300))]
    pub site_name: Option<String>,
}

impl From<PreviewRequest> for PreviewMetadata {
    fn from(preview: PreviewRequest) -> Self {
        Self {
            title: preview.title,
            description: preview.description,
            image: preview.image,
            site_name: preview.site_name,
        }
    }
}

/// Response for a successfully created link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub preview: PreviewMetadata,
    pub created_at: DateTime<Utc>,
}

impl ShortenResponse {
    /// Builds the response from the stored record and the public base URL.
    pub fn from_record(record: LinkRecord, base_url: &str) -> Self {
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), record.short_code);
        Self {
            short_code: record.short_code,
            original_url: record.original_url,
            short_url,
            preview: record.preview,
            created_at: record.created_at,
        }
    }
}
