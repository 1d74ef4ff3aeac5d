//! Storage adapter implementations.
//!
//! Each adapter implements [`crate::domain::store::StorageAdapter`] against
//! one physical database and owns its schema bootstrap. Adapters are
//! constructed unconnected; the aggregating store drives `connect()` during
//! its single-flight initialization.
//!
//! # Adapters
//!
//! - [`MongoAdapter`] - document store, MongoDB connection URI
//! - [`LibsqlAdapter`] - remote libSQL over HTTP, URL + auth token
//! - [`PgAdapter`] - PostgreSQL, connection URL

pub mod libsql_adapter;
pub mod mongo_adapter;
pub mod pg_adapter;

pub use libsql_adapter::LibsqlAdapter;
pub use mongo_adapter::MongoAdapter;
pub use pg_adapter::PgAdapter;
