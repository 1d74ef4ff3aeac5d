//! Handler for click tracking.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use validator::Validate;

use crate::api::dto::track::{TrackRequest, TrackResponse};
use crate::api::handlers::validation_error;
use crate::domain::entities::AnalyticsEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Records one redirect: appends an analytics event and bumps the click
/// counter.
///
/// # Endpoint
///
/// `POST /api/track`
///
/// The event is written to the first healthy backend; the counter increment
/// fans out to every backend, because after failover writes any of them may
/// hold the link. Partial increment failures are invisible to the caller.
///
/// Location is taken from the request body when supplied; the service does
/// no geolocation lookup of its own.
///
/// # Errors
///
/// Returns 503 only when every backend refused the event write.
pub async fn track_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<(StatusCode, Json<TrackResponse>), AppError> {
    request.validate().map_err(validation_error)?;

    let ip = client_ip(&headers, state.behind_proxy);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut event = AnalyticsEvent::new(request.short_code.clone(), Some(ip), user_agent)
        .with_location(request.city, request.country);

    if let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) {
        event = event.with_coordinates(latitude, longitude);
    }

    state.store.log_event(&event).await?;

    // Backends without the code treat this as a no-op.
    state.store.increment_clicks(&request.short_code).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(TrackResponse { success: true }),
    ))
}
