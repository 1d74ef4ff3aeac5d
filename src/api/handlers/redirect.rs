//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// The lookup fails over across backends in configured order and returns
/// the first hit; a backend outage is invisible here as long as any backend
/// still holds the code. Click tracking is not done on this path - the
/// redirect page reports the visit through `POST /api/track`.
///
/// # Errors
///
/// Returns 404 when no backend knows the code.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let link = state
        .store
        .get_link(&code)
        .await
        .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

    Ok(Redirect::temporary(&link.original_url))
}
