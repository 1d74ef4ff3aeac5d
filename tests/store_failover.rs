//! End-to-end behavior of the aggregate store over real (in-memory) and
//! deliberately broken adapters.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::{Duration, TimeZone, Utc};
use common::{FaultyAdapter, MemoryAdapter, UnreachableAdapter, event_at, link_by};
use shortstack::prelude::*;

fn new_link(code: &str) -> LinkRecord {
    LinkRecord::new(
        "https://example.com".to_string(),
        code.to_string(),
        Some("203.0.113.7".to_string()),
        PreviewMetadata::default(),
    )
}

#[tokio::test]
async fn test_save_then_get_roundtrip_for_growing_adapter_lists() {
    for size in 1..=3 {
        let adapters: Vec<Arc<dyn StorageAdapter>> = (0..size)
            .map(|_| Arc::new(MemoryAdapter::new()) as Arc<dyn StorageAdapter>)
            .collect();
        let store = AggregateStore::new(adapters);

        let record = new_link("abc123");
        store.save_link(&record).await.unwrap();

        let found = store.get_link("abc123").await.unwrap();
        assert_eq!(found, record, "roundtrip failed with {size} adapters");
    }
}

#[tokio::test]
async fn test_failover_write_lands_on_exactly_one_backend() {
    let faulty = Arc::new(FaultyAdapter);
    let first = Arc::new(MemoryAdapter::new());
    let second = Arc::new(MemoryAdapter::new());

    let store = AggregateStore::new(vec![
        faulty.clone() as Arc<dyn StorageAdapter>,
        first.clone() as Arc<dyn StorageAdapter>,
        second.clone() as Arc<dyn StorageAdapter>,
    ]);

    store.save_link(&new_link("abc123")).await.unwrap();

    // The write stopped at the first backend that accepted it.
    assert!(first.has_link("abc123"));
    assert!(!second.has_link("abc123"));
}

#[tokio::test]
async fn test_increment_clicks_fans_out_and_skips_absent_codes() {
    let a = Arc::new(MemoryAdapter::new());
    let b = Arc::new(MemoryAdapter::new());
    let c = Arc::new(MemoryAdapter::new());

    a.seed_link(new_link("abc123"));
    c.seed_link(new_link("abc123"));

    let store = AggregateStore::new(vec![
        a.clone() as Arc<dyn StorageAdapter>,
        b.clone() as Arc<dyn StorageAdapter>,
        c.clone() as Arc<dyn StorageAdapter>,
    ]);

    store.increment_clicks("abc123").await;

    assert_eq!(a.link("abc123").unwrap().clicks, 1);
    assert_eq!(c.link("abc123").unwrap().clicks, 1);
    assert!(!b.has_link("abc123"));
}

#[tokio::test]
async fn test_get_events_merges_overlapping_backends_to_the_cap() {
    let a = Arc::new(MemoryAdapter::new());
    let b = Arc::new(MemoryAdapter::new());

    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    for i in 0..60 {
        a.seed_event(event_at("abc123", base + Duration::seconds(i)));
    }
    for i in 30..100 {
        b.seed_event(event_at("abc123", base + Duration::seconds(i)));
    }

    let store = AggregateStore::new(vec![
        a as Arc<dyn StorageAdapter>,
        b as Arc<dyn StorageAdapter>,
    ]);

    let merged = store.get_events("abc123").await;

    assert_eq!(merged.len(), EVENT_QUERY_LIMIT);
    for pair in merged.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
    // Duplicates from the overlapping range survive the merge.
    let newest = base + Duration::seconds(99);
    assert_eq!(merged[0].timestamp, newest);
}

#[tokio::test]
async fn test_count_links_fails_open_when_every_backend_is_down() {
    let store = AggregateStore::new(vec![
        Arc::new(FaultyAdapter) as Arc<dyn StorageAdapter>,
        Arc::new(UnreachableAdapter) as Arc<dyn StorageAdapter>,
    ]);

    let count = store
        .count_links_by_ip("203.0.113.7", Utc::now() - Duration::hours(24))
        .await;

    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_count_links_by_ip_honors_the_window() {
    let adapter = Arc::new(MemoryAdapter::new());
    let now = Utc::now();

    adapter.seed_link(link_by("aaaa1111", "203.0.113.7", now - Duration::hours(1)));
    adapter.seed_link(link_by("bbbb2222", "203.0.113.7", now - Duration::hours(48)));
    adapter.seed_link(link_by("cccc3333", "198.51.100.2", now - Duration::hours(1)));

    let store = AggregateStore::new(vec![adapter as Arc<dyn StorageAdapter>]);

    let count = store
        .count_links_by_ip("203.0.113.7", now - Duration::hours(24))
        .await;

    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_initialization_is_idempotent() {
    let adapter = Arc::new(MemoryAdapter::new());

    // The contract itself allows repeated connects without side effects.
    adapter.connect().await.unwrap();
    adapter.connect().await.unwrap();
    adapter.connect_calls.store(0, Ordering::SeqCst);

    let store = AggregateStore::new(vec![adapter.clone() as Arc<dyn StorageAdapter>]);

    assert_eq!(store.connected_backends().await, 1);
    assert_eq!(store.connected_backends().await, 1);
    store.increment_clicks("abc123").await;

    // The store connected each adapter exactly once.
    assert_eq!(adapter.connect_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_code_surfaces_from_single_backend() {
    let store = AggregateStore::new(vec![
        Arc::new(MemoryAdapter::new()) as Arc<dyn StorageAdapter>,
    ]);

    store.save_link(&new_link("abc123")).await.unwrap();
    let err = store.save_link(&new_link("abc123")).await.unwrap_err();

    assert!(matches!(err, StoreError::DuplicateCode { .. }));
}

#[tokio::test]
async fn test_empty_adapter_list_degrades_instead_of_panicking() {
    let store = AggregateStore::new(Vec::new());

    assert!(store.get_link("abc123").await.is_none());
    assert!(store.get_events("abc123").await.is_empty());
    assert_eq!(store.count_links_by_ip("203.0.113.7", Utc::now()).await, 0);
    store.increment_clicks("abc123").await;

    let err = store.save_link(&new_link("abc123")).await.unwrap_err();
    assert!(matches!(err, StoreError::Exhausted));
}

#[tokio::test]
async fn test_end_to_end_with_one_dead_backend() {
    let healthy = Arc::new(MemoryAdapter::new());

    let store = AggregateStore::new(vec![
        healthy.clone() as Arc<dyn StorageAdapter>,
        Arc::new(UnreachableAdapter) as Arc<dyn StorageAdapter>,
    ]);

    // One adapter refuses to connect; the store runs on the survivor.
    assert_eq!(store.connected_backends().await, 1);

    let record = LinkRecord::new(
        "https://example.com".to_string(),
        "abc123".to_string(),
        None,
        PreviewMetadata::default(),
    );
    store.save_link(&record).await.unwrap();

    let found = store.get_link("abc123").await.unwrap();
    assert_eq!(found.original_url, "https://example.com");

    // Absence is a value, not an error.
    assert!(store.get_link("zzz999").await.is_none());
}
