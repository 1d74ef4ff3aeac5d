//! HTTP server initialization and runtime setup.
//!
//! Builds the storage adapters from configuration, wires the aggregate
//! store into shared state, and runs the Axum server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;

use crate::config::Config;
use crate::domain::store::{AggregateStore, StorageAdapter};
use crate::infrastructure::persistence::{LibsqlAdapter, MongoAdapter, PgAdapter};
use crate::routes::app_router;
use crate::state::AppState;

/// Builds adapters in failover order: document stores first, then libSQL,
/// then Postgres. Adapters are constructed unconnected; the store connects
/// them lazily on first use and drops the ones that fail.
pub fn build_adapters(config: &Config) -> Vec<Arc<dyn StorageAdapter>> {
    let mut adapters: Vec<Arc<dyn StorageAdapter>> = Vec::new();

    for uri in &config.mongo_uris {
        adapters.push(Arc::new(MongoAdapter::new(uri.clone())));
    }

    if let Some(libsql) = &config.libsql {
        adapters.push(Arc::new(LibsqlAdapter::new(
            libsql.url.clone(),
            libsql.auth_token.clone(),
        )));
    }

    if let Some(url) = &config.postgres_url {
        adapters.push(Arc::new(PgAdapter::new(url.clone())));
    }

    adapters
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if the listen address is invalid, the bind fails, or
/// the server loop errors out. Unreachable storage backends are not fatal:
/// the store drops them during its lazy initialization.
pub async fn run(config: Config) -> Result<()> {
    let adapters = build_adapters(&config);
    tracing::info!(backends = adapters.len(), "storage backends configured");

    let store = Arc::new(AggregateStore::with_timeout(
        adapters,
        Duration::from_secs(config.adapter_timeout_secs),
    ));

    let state = AppState::new(
        store,
        config.base_urls.clone(),
        config.behind_proxy,
        config.rate_limit_max_links,
        config.rate_limit_window_secs,
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
