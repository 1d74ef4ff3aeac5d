//! Handler for the domain listing endpoint.

use axum::{Json, extract::State};

use crate::api::dto::domains::DomainsResponse;
use crate::state::AppState;

/// Lists the public base URLs configured for this deployment.
///
/// # Endpoint
///
/// `GET /api/domains`
pub async fn domains_handler(State(state): State<AppState>) -> Json<DomainsResponse> {
    Json(DomainsResponse {
        domains: state.base_urls.as_ref().clone(),
    })
}
