//! DTOs for the click tracking endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request reporting one redirect, sent by the redirect page.
///
/// Location fields are optional and supplied by the caller; the service
/// performs no geolocation lookup of its own.
#[derive(Debug, Deserialize, Validate)]
pub struct TrackRequest {
    #[validate(length(min = 1, message = "Short code is required"))]
    pub short_code: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(length(max = 200))]
    pub city: Option<String>,

    #[validate(length(max = 200))]
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,
}
