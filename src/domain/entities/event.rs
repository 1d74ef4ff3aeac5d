//! Analytics event recorded for each tracked redirect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single click/visit event on a short link.
///
/// Events are append-only: the core never mutates or deletes them. They are
/// read back only for analytics display, most recent first. The `short_code`
/// references a [`crate::domain::entities::LinkRecord`] by code, but the
/// reference is not enforced across backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub short_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Present only when the client supplied precise geolocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl AnalyticsEvent {
    /// Creates an event stamped with the current time.
    pub fn new(short_code: String, ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            short_code,
            ip,
            city: None,
            country: None,
            user_agent,
            timestamp: Utc::now(),
            latitude: None,
            longitude: None,
        }
    }

    /// Attaches coarse location derived from the request context.
    pub fn with_location(mut self, city: Option<String>, country: Option<String>) -> Self {
        self.city = city;
        self.country = country;
        self
    }

    /// Attaches precise coordinates supplied by the client.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}
