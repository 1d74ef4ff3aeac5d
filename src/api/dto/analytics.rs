//! DTOs for the analytics query endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::AnalyticsEvent;

/// Query string of `GET /api/analytics`.
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// Short code to fetch events for; an absent code yields an empty list.
    pub code: Option<String>,
}

/// One analytics event on the wire, most recent first.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub short_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<AnalyticsEvent> for EventResponse {
    fn from(event: AnalyticsEvent) -> Self {
        Self {
            short_code: event.short_code,
            ip: event.ip,
            city: event.city,
            country: event.country,
            user_agent: event.user_agent,
            timestamp: event.timestamp,
            latitude: event.latitude,
            longitude: event.longitude,
        }
    }
}
