//! Handler for link creation.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::handlers::validation_error;
use crate::domain::entities::{LinkRecord, PreviewMetadata};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;
use crate::utils::code_generator::{generate_code, validate_custom_code};

/// Retries when a generated code collides in every backend that answered.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Flow
///
/// 1. Validate the URL (absolute, http/https)
/// 2. Count links recently created by the client IP; reject over the limit.
///    The count comes from the first backend that answers and fails open:
///    with every backend down, creation is allowed rather than blocked.
/// 3. Generate a code (or validate the custom one)
/// 4. Persist via failover write: the first healthy backend stores the record
///
/// # Errors
///
/// - 400 for an invalid URL or custom code
/// - 409 when a custom code already exists
/// - 429 when the client exceeded the creation limit
/// - 503 when every storage backend refused the write
pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    request.validate().map_err(validation_error)?;

    let parsed = url::Url::parse(&request.url)
        .map_err(|e| AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() })))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::bad_request(
            "URL must use http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    let ip = client_ip(&headers, state.behind_proxy);

    let since = Utc::now() - Duration::seconds(state.rate_limit_window_secs);
    let created = state.store.count_links_by_ip(&ip, since).await;
    if created >= state.rate_limit_max_links {
        return Err(AppError::rate_limited(
            "Link creation limit reached, try again later",
            json!({
                "limit": state.rate_limit_max_links,
                "window_secs": state.rate_limit_window_secs,
            }),
        ));
    }

    let preview = request.preview.map(Into::into).unwrap_or_default();

    let record = if let Some(custom) = request.custom_code {
        validate_custom_code(&custom)?;

        let record = LinkRecord::new(request.url.clone(), custom, Some(ip), preview);
        state.store.save_link(&record).await?;
        record
    } else {
        save_with_generated_code(&state, &request.url, &ip, preview).await?
    };

    let base_url = state
        .base_urls
        .first()
        .map(String::as_str)
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse::from_record(record, base_url)),
    ))
}

/// Saves under a random code, regenerating on the rare collision.
async fn save_with_generated_code(
    state: &AppState,
    url: &str,
    ip: &str,
    preview: PreviewMetadata,
) -> Result<LinkRecord, AppError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let record = LinkRecord::new(
            url.to_string(),
            generate_code(),
            Some(ip.to_string()),
            preview.clone(),
        );

        match state.store.save_link(&record).await {
            Ok(()) => return Ok(record),
            Err(err) if err.is_duplicate() => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::internal(
        "Failed to allocate a unique short code",
        json!({ "attempts": MAX_CODE_ATTEMPTS }),
    ))
}
