//! Storage contract and the aggregating store built on top of it.
//!
//! - [`adapter`] - the [`StorageAdapter`] capability contract and error taxonomy
//! - [`aggregate`] - [`AggregateStore`], fanning operations across adapters
//!
//! Concrete adapters live in [`crate::infrastructure::persistence`]; mocks
//! for the contract are auto-generated via `mockall` under `cfg(test)`.

pub mod adapter;
pub mod aggregate;

pub use adapter::{EVENT_QUERY_LIMIT, StorageAdapter, StoreError, StoreResult};
pub use aggregate::{AggregateStore, DEFAULT_ADAPTER_TIMEOUT};

#[cfg(test)]
pub use adapter::MockStorageAdapter;
