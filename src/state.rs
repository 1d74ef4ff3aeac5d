//! Shared application state injected into handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::domain::store::AggregateStore;

/// State shared by every handler.
///
/// The aggregate store is the only stateful collaborator; the rest are
/// configuration values fixed at boot.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AggregateStore>,
    /// Public base URLs, first entry used to build short URLs.
    pub base_urls: Arc<Vec<String>>,
    /// Trust forwarded headers for client IPs.
    pub behind_proxy: bool,
    /// Links one IP may create within the window.
    pub rate_limit_max_links: i64,
    pub rate_limit_window_secs: i64,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<AggregateStore>,
        base_urls: Vec<String>,
        behind_proxy: bool,
        rate_limit_max_links: i64,
        rate_limit_window_secs: i64,
    ) -> Self {
        Self {
            store,
            base_urls: Arc::new(base_urls),
            behind_proxy,
            rate_limit_max_links,
            rate_limit_window_secs,
            started_at: Instant::now(),
        }
    }
}
