//! HTTP request handlers for API endpoints.
//!
//! Handlers are thin glue: they translate requests into aggregate store
//! calls and store results into responses. All storage policy (failover,
//! fan-out, fail-open) lives in the store.

pub mod analytics;
pub mod domains;
pub mod health;
pub mod redirect;
pub mod shorten;
pub mod track;

pub use analytics::analytics_handler;
pub use domains::domains_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use track::track_handler;

use crate::error::AppError;

/// Converts validator output into the standard 400 response body.
pub(crate) fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::bad_request(
        "Validation failed",
        serde_json::to_value(&errors).unwrap_or_default(),
    )
}
