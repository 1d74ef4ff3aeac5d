//! Storage adapter contract implemented by every physical backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::{AnalyticsEvent, LinkRecord};

/// Maximum number of analytics events a single query returns.
pub const EVENT_QUERY_LIMIT: usize = 100;

/// Errors raised by storage backends and the aggregating store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or misconfigured. Raised by `connect`; the
    /// aggregating store drops the adapter instead of failing the process.
    #[error("backend connection failed: {0}")]
    Connection(#[source] anyhow::Error),

    /// Short code collision on insert in one backend.
    #[error("short code {code:?} already exists")]
    DuplicateCode { code: String },

    /// Every configured backend failed a failover write.
    #[error("no storage backend available")]
    Exhausted,

    /// Any other driver-level failure. Caught and logged at the store
    /// boundary, never propagated raw to consumers.
    #[error("backend operation failed: {0}")]
    Backend(#[source] anyhow::Error),
}

impl StoreError {
    pub fn connection(err: impl Into<anyhow::Error>) -> Self {
        Self::Connection(err.into())
    }

    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::Backend(err.into())
    }

    pub fn duplicate(code: impl Into<String>) -> Self {
        Self::DuplicateCode { code: code.into() }
    }

    /// Returns true for a short-code collision.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateCode { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Capability contract against one physical database.
///
/// Each adapter owns exactly one backend (identity = its connection
/// parameters) and its schema bootstrap. Operations are idempotent-safe for
/// the caller to retry but are never retried internally. No adapter is aware
/// of any other; fan-out and failover live in
/// [`crate::domain::store::AggregateStore`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MongoAdapter`] - document store
/// - [`crate::infrastructure::persistence::LibsqlAdapter`] - remote SQL, URL + auth token
/// - [`crate::infrastructure::persistence::PgAdapter`] - Postgres by URL
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Short backend label used in logs (`"mongodb"`, `"libsql"`, `"postgres"`).
    fn name(&self) -> &'static str;

    /// Establishes or validates connectivity and bootstraps the physical
    /// schema (create-if-absent tables/collections/indexes, additive column
    /// migration tolerant of "already exists").
    ///
    /// Safe to call repeatedly; a second call must not repeat side effects
    /// or fail on existing schema objects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the backend is unreachable.
    /// The caller decides whether to exclude the adapter.
    async fn connect(&self) -> StoreResult<()>;

    /// Persists a new link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateCode`] when the short code already
    /// exists in this backend.
    async fn save_link(&self, link: &LinkRecord) -> StoreResult<()>;

    /// Point lookup by short code. Absence is `Ok(None)`, never an error.
    async fn get_link(&self, short_code: &str) -> StoreResult<Option<LinkRecord>>;

    /// Atomically increments the click counter. No-op (not an error) when
    /// the code is absent in this backend.
    async fn increment_clicks(&self, short_code: &str) -> StoreResult<()>;

    /// Appends one analytics event.
    async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()>;

    /// Returns up to [`EVENT_QUERY_LIMIT`] most recent events for the code,
    /// ordered by timestamp descending.
    async fn get_events(&self, short_code: &str) -> StoreResult<Vec<AnalyticsEvent>>;

    /// Counts links created by `ip` at or after `since`, for rate limiting.
    async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detection() {
        let err = StoreError::duplicate("abc123");
        assert!(err.is_duplicate());
        assert!(!StoreError::Exhausted.is_duplicate());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::duplicate("abc123");
        assert_eq!(err.to_string(), "short code \"abc123\" already exists");

        assert_eq!(
            StoreError::Exhausted.to_string(),
            "no storage backend available"
        );
    }
}
