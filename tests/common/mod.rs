#![allow(dead_code)]

//! Shared test doubles: an in-memory storage adapter plus deliberately
//! broken ones, and helpers to assemble application state around them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shortstack::prelude::*;

/// Fully functional in-memory backend.
///
/// Mirrors the semantics a real adapter must provide: unique short codes,
/// no-op increments for absent codes, newest-first event queries capped at
/// the query limit.
pub struct MemoryAdapter {
    links: Mutex<HashMap<String, LinkRecord>>,
    events: Mutex<Vec<AnalyticsEvent>>,
    pub connect_calls: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
        }
    }

    /// Inserts a record directly, bypassing the storage contract.
    pub fn seed_link(&self, record: LinkRecord) {
        self.links
            .lock()
            .unwrap()
            .insert(record.short_code.clone(), record);
    }

    pub fn seed_event(&self, event: AnalyticsEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn link(&self, short_code: &str) -> Option<LinkRecord> {
        self.links.lock().unwrap().get(short_code).cloned()
    }

    pub fn has_link(&self, short_code: &str) -> bool {
        self.links.lock().unwrap().contains_key(short_code)
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> StoreResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_link(&self, link: &LinkRecord) -> StoreResult<()> {
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&link.short_code) {
            return Err(StoreError::duplicate(link.short_code.clone()));
        }
        links.insert(link.short_code.clone(), link.clone());
        Ok(())
    }

    async fn get_link(&self, short_code: &str) -> StoreResult<Option<LinkRecord>> {
        Ok(self.links.lock().unwrap().get(short_code).cloned())
    }

    async fn increment_clicks(&self, short_code: &str) -> StoreResult<()> {
        if let Some(link) = self.links.lock().unwrap().get_mut(short_code) {
            link.clicks += 1;
        }
        Ok(())
    }

    async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn get_events(&self, short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        let mut events: Vec<AnalyticsEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.short_code == short_code)
            .cloned()
            .collect();

        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(EVENT_QUERY_LIMIT);
        Ok(events)
    }

    async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<i64> {
        let count = self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.creator_ip.as_deref() == Some(ip) && l.created_at >= since)
            .count();
        Ok(count as i64)
    }
}

/// Backend whose `connect` always fails; the store must drop it.
pub struct UnreachableAdapter;

#[async_trait]
impl StorageAdapter for UnreachableAdapter {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn connect(&self) -> StoreResult<()> {
        Err(StoreError::connection(anyhow::anyhow!(
            "connection refused"
        )))
    }

    async fn save_link(&self, _link: &LinkRecord) -> StoreResult<()> {
        unreachable!("adapter was never connected")
    }

    async fn get_link(&self, _short_code: &str) -> StoreResult<Option<LinkRecord>> {
        unreachable!("adapter was never connected")
    }

    async fn increment_clicks(&self, _short_code: &str) -> StoreResult<()> {
        unreachable!("adapter was never connected")
    }

    async fn log_event(&self, _event: &AnalyticsEvent) -> StoreResult<()> {
        unreachable!("adapter was never connected")
    }

    async fn get_events(&self, _short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        unreachable!("adapter was never connected")
    }

    async fn count_links_by_ip(&self, _ip: &str, _since: DateTime<Utc>) -> StoreResult<i64> {
        unreachable!("adapter was never connected")
    }
}

/// Backend that connects fine but fails every operation afterwards.
pub struct FaultyAdapter;

impl FaultyAdapter {
    fn err() -> StoreError {
        StoreError::backend(anyhow::anyhow!("disk on fire"))
    }
}

#[async_trait]
impl StorageAdapter for FaultyAdapter {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn connect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn save_link(&self, _link: &LinkRecord) -> StoreResult<()> {
        Err(Self::err())
    }

    async fn get_link(&self, _short_code: &str) -> StoreResult<Option<LinkRecord>> {
        Err(Self::err())
    }

    async fn increment_clicks(&self, _short_code: &str) -> StoreResult<()> {
        Err(Self::err())
    }

    async fn log_event(&self, _event: &AnalyticsEvent) -> StoreResult<()> {
        Err(Self::err())
    }

    async fn get_events(&self, _short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        Err(Self::err())
    }

    async fn count_links_by_ip(&self, _ip: &str, _since: DateTime<Utc>) -> StoreResult<i64> {
        Err(Self::err())
    }
}

/// Builds a link record with an explicit creator IP and creation time.
pub fn link_by(code: &str, creator_ip: &str, created_at: DateTime<Utc>) -> LinkRecord {
    let mut record = LinkRecord::new(
        "https://example.com".to_string(),
        code.to_string(),
        Some(creator_ip.to_string()),
        PreviewMetadata::default(),
    );
    record.created_at = created_at;
    record
}

/// Builds an event with an explicit timestamp.
pub fn event_at(code: &str, timestamp: DateTime<Utc>) -> AnalyticsEvent {
    let mut event = AnalyticsEvent::new(code.to_string(), None, None);
    event.timestamp = timestamp;
    event
}

/// Application state over the given adapters with test-friendly defaults:
/// forwarded headers are trusted so tests can pick their client IP.
pub fn test_state(adapters: Vec<Arc<dyn StorageAdapter>>) -> AppState {
    test_state_with_limit(adapters, 60, 86_400)
}

pub fn test_state_with_limit(
    adapters: Vec<Arc<dyn StorageAdapter>>,
    max_links: i64,
    window_secs: i64,
) -> AppState {
    AppState::new(
        Arc::new(AggregateStore::new(adapters)),
        vec!["https://sho.rt".to_string()],
        true,
        max_links,
        window_secs,
    )
}
