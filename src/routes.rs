//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`         - short link redirect
//! - `POST /api/shorten`    - create a short link
//! - `POST /api/track`      - report a redirect (analytics + click counter)
//! - `GET  /api/analytics`  - recent events for a code
//! - `GET  /api/health`     - liveness + backend roster
//! - `GET  /api/domains`    - configured public base URLs
//!
//! # Middleware
//!
//! - **Tracing** - structured request/response logging
//! - **Rate limiting** - per-IP token bucket on the API routes
//! - **Path normalization** - trailing slash handling

use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::LatencyUnit;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api::handlers::{
    analytics_handler, domains_handler, health_handler, redirect_handler, shorten_handler,
    track_handler,
};
use crate::api::middleware::rate_limit;
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
///
/// The returned service must be served with connect info: the rate limiter
/// keys on the socket peer address.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let api_router = Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/track", post(track_handler))
        .route("/analytics", get(analytics_handler))
        .route("/health", get(health_handler))
        .route("/domains", get(domains_handler))
        .layer(rate_limit::layer());

    let router = Router::new()
        .route("/{code}", get(redirect_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
