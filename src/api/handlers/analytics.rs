//! Handler for analytics queries.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::analytics::{AnalyticsQuery, EventResponse};
use crate::state::AppState;

/// Returns the most recent events for a short code, newest first.
///
/// # Endpoint
///
/// `GET /api/analytics?code={code}`
///
/// Events are merged from every backend, capped at 100. A backend outage
/// shrinks the result instead of failing the call, and an unknown code (or
/// a missing `code` parameter) yields an empty list.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Json<Vec<EventResponse>> {
    let Some(code) = query.code else {
        return Json(Vec::new());
    };

    let events = state.store.get_events(&code).await;

    Json(events.into_iter().map(EventResponse::from).collect())
}
