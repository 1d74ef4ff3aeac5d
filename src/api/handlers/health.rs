//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{BackendsStatus, HealthResponse};
use crate::state::AppState;

/// Returns service health with the storage backend roster.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Response Codes
///
/// - **200 OK**: at least one backend is connected (or none is configured)
/// - **503 Service Unavailable**: backends are configured but none survived
///   `connect()`
///
/// The first call triggers the store's lazy initialization; later calls
/// only read the frozen roster.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let configured = state.store.configured_backends();
    let connected = state.store.connected_backends().await;

    let degraded = configured > 0 && connected == 0;

    let response = HealthResponse {
        status: if degraded { "degraded" } else { "healthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        backends: BackendsStatus {
            configured,
            connected,
        },
    };

    if degraded {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    } else {
        Ok(Json(response))
    }
}
