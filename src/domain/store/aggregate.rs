//! Aggregating store fanning operations across all configured backends.
//!
//! [`AggregateStore`] holds an ordered list of storage adapters and exposes
//! the same capability contract as a single backend, implemented as policies
//! over the list:
//!
//! - **Sequential failover** (`save_link`, `log_event`, `get_link`,
//!   `count_links_by_ip`) - try adapters in list order, stop at the first
//!   success. Writes stop at one backend to bound write amplification and
//!   avoid divergent uniqueness outcomes; reads return the first hit.
//! - **Fan-out** (`increment_clicks`, `get_events`) - dispatch to every
//!   adapter concurrently and join all results, collecting successes and
//!   failures separately. After failover writes the store cannot know which
//!   backend holds the authoritative copy, so increments go everywhere and
//!   event queries merge everything.
//!
//! Initialization is lazy and single-flight: the first call to any contract
//! method connects every configured adapter exactly once, drops the ones
//! that fail with a warning, and freezes the surviving list for the process
//! lifetime. There is no reconnect path; restarting the process is the
//! recovery path for a fully dead backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::adapter::{EVENT_QUERY_LIMIT, StorageAdapter, StoreError, StoreResult};
use crate::domain::entities::{AnalyticsEvent, LinkRecord};

/// Default ceiling on a single adapter call, so one hung backend cannot
/// stall a failover chain.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(5);

/// The single logical store the rest of the service talks to.
///
/// Constructed once at boot from the configured adapters and passed to
/// consumers as shared state; the adapter list is written at initialization
/// and read-only thereafter.
pub struct AggregateStore {
    configured: Vec<Arc<dyn StorageAdapter>>,
    live: OnceCell<Vec<Arc<dyn StorageAdapter>>>,
    call_timeout: Duration,
}

impl AggregateStore {
    /// Creates a store over the given adapters with the default per-call timeout.
    ///
    /// The list order is the failover priority. An empty list is allowed:
    /// the store still works, with every operation degrading to its
    /// "all backends failed" branch.
    pub fn new(configured: Vec<Arc<dyn StorageAdapter>>) -> Self {
        Self::with_timeout(configured, DEFAULT_ADAPTER_TIMEOUT)
    }

    /// Creates a store with an explicit per-adapter call timeout.
    pub fn with_timeout(configured: Vec<Arc<dyn StorageAdapter>>, call_timeout: Duration) -> Self {
        Self {
            configured,
            live: OnceCell::new(),
            call_timeout,
        }
    }

    /// Number of adapters configured at construction time.
    pub fn configured_backends(&self) -> usize {
        self.configured.len()
    }

    /// Number of adapters that survived `connect()`. Triggers
    /// initialization when it has not happened yet.
    pub async fn connected_backends(&self) -> usize {
        self.adapters().await.len()
    }

    /// Returns the live adapter list, connecting all configured adapters on
    /// first use. Concurrent first calls share one initialization attempt.
    async fn adapters(&self) -> &[Arc<dyn StorageAdapter>] {
        self.live
            .get_or_init(|| async {
                let mut live = Vec::with_capacity(self.configured.len());
                for adapter in &self.configured {
                    match self.bounded(adapter.name(), adapter.connect()).await {
                        Ok(()) => {
                            info!(backend = adapter.name(), "storage backend connected");
                            live.push(Arc::clone(adapter));
                        }
                        Err(err) => {
                            warn!(
                                backend = adapter.name(),
                                error = %err,
                                "dropping storage backend: connect failed"
                            );
                        }
                    }
                }

                if live.is_empty() {
                    warn!("no storage backend connected; every operation will degrade");
                } else {
                    info!(backends = live.len(), "aggregate store ready");
                }

                live
            })
            .await
    }

    /// Bounds one adapter call with the configured timeout. A timeout
    /// counts as that adapter's failure.
    async fn bounded<T, F>(&self, backend: &'static str, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::backend(anyhow::anyhow!(
                "{backend} did not respond within {:?}",
                self.call_timeout
            ))),
        }
    }

    /// Persists a link to the first backend that accepts it.
    ///
    /// Adapters are tried in list order; the first success ends the write,
    /// so exactly one backend receives the record. A short-code collision on
    /// one backend does not stop the chain, but if the write ultimately
    /// fails everywhere, the collision is surfaced in preference to the
    /// generic exhaustion: it is a definitive business outcome rather than
    /// an availability problem.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateCode`] or [`StoreError::Exhausted`] when every
    /// adapter raised.
    pub async fn save_link(&self, link: &LinkRecord) -> StoreResult<()> {
        let mut duplicate = None;

        for adapter in self.adapters().await {
            match self.bounded(adapter.name(), adapter.save_link(link)).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_duplicate() => {
                    warn!(
                        backend = adapter.name(),
                        code = %link.short_code,
                        "short code collision, trying next backend"
                    );
                    duplicate.get_or_insert(err);
                }
                Err(err) => {
                    warn!(
                        backend = adapter.name(),
                        error = %err,
                        "link write failed, trying next backend"
                    );
                }
            }
        }

        Err(duplicate.unwrap_or(StoreError::Exhausted))
    }

    /// Looks a link up, returning the first backend's hit.
    ///
    /// Adapter errors are logged and skipped; `None` means every backend
    /// either answered "absent" or failed. Absence is a value, not an error.
    pub async fn get_link(&self, short_code: &str) -> Option<LinkRecord> {
        for adapter in self.adapters().await {
            match self
                .bounded(adapter.name(), adapter.get_link(short_code))
                .await
            {
                Ok(Some(link)) => return Some(link),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        backend = adapter.name(),
                        error = %err,
                        "link lookup failed, trying next backend"
                    );
                }
            }
        }

        None
    }

    /// Increments the click counter on every backend concurrently.
    ///
    /// Best-effort: per-adapter failures are logged individually and the
    /// call itself never fails. Backends that do not hold the code treat
    /// the increment as a no-op.
    pub async fn increment_clicks(&self, short_code: &str) {
        let adapters = self.adapters().await;

        let results = join_all(
            adapters
                .iter()
                .map(|adapter| self.bounded(adapter.name(), adapter.increment_clicks(short_code))),
        )
        .await;

        for (adapter, result) in adapters.iter().zip(results) {
            if let Err(err) = result {
                warn!(
                    backend = adapter.name(),
                    error = %err,
                    "click increment failed"
                );
            }
        }
    }

    /// Appends an analytics event to the first backend that accepts it.
    ///
    /// Same failover policy and rationale as [`Self::save_link`].
    ///
    /// # Errors
    ///
    /// [`StoreError::Exhausted`] when every adapter raised.
    pub async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        for adapter in self.adapters().await {
            match self.bounded(adapter.name(), adapter.log_event(event)).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        backend = adapter.name(),
                        error = %err,
                        "event write failed, trying next backend"
                    );
                }
            }
        }

        Err(StoreError::Exhausted)
    }

    /// Queries every backend concurrently and merges the results.
    ///
    /// Failed adapters contribute an empty partial result. The merged
    /// sequence is sorted by timestamp descending and truncated to
    /// [`EVENT_QUERY_LIMIT`]. Events written to more than one backend are
    /// not deduplicated; with failover writes duplicates are rare but not
    /// structurally prevented.
    pub async fn get_events(&self, short_code: &str) -> Vec<AnalyticsEvent> {
        let adapters = self.adapters().await;

        let results = join_all(
            adapters
                .iter()
                .map(|adapter| self.bounded(adapter.name(), adapter.get_events(short_code))),
        )
        .await;

        let mut merged = Vec::new();
        for (adapter, result) in adapters.iter().zip(results) {
            match result {
                Ok(events) => merged.extend(events),
                Err(err) => {
                    warn!(
                        backend = adapter.name(),
                        error = %err,
                        "event query failed, merging without this backend"
                    );
                }
            }
        }

        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        merged.truncate(EVENT_QUERY_LIMIT);
        merged
    }

    /// Counts links created by `ip` since `since`, for rate limiting.
    ///
    /// The first non-raising count wins, a legitimate zero included.
    /// Returns 0 when every adapter raises: under a full backend outage
    /// rate limiting fails open instead of blocking legitimate use.
    pub async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> i64 {
        for adapter in self.adapters().await {
            match self
                .bounded(adapter.name(), adapter.count_links_by_ip(ip, since))
                .await
            {
                Ok(count) => return count,
                Err(err) => {
                    warn!(
                        backend = adapter.name(),
                        error = %err,
                        "link count failed, trying next backend"
                    );
                }
            }
        }

        0
    }
}
