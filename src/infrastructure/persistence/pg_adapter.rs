//! PostgreSQL implementation of the storage adapter.
//!
//! Connects by URL through a small SQLx pool. The preview metadata is
//! serialized into a JSON text column; timestamps use `timestamptz` so
//! range filters and ordering are native.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tokio::sync::OnceCell;

use crate::domain::entities::{AnalyticsEvent, LinkRecord, PreviewMetadata};
use crate::domain::store::{EVENT_QUERY_LIMIT, StorageAdapter, StoreError, StoreResult};

const POOL_MAX_CONNECTIONS: u32 = 5;

/// Postgres backend addressed by a connection URL.
pub struct PgAdapter {
    url: String,
    pool: OnceCell<PgPool>,
}

impl PgAdapter {
    pub fn new(url: String) -> Self {
        Self {
            url,
            pool: OnceCell::new(),
        }
    }

    /// Opens the pool on first use; concurrent callers share one attempt.
    async fn pool(&self) -> StoreResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .max_connections(POOL_MAX_CONNECTIONS)
                    .connect(&self.url)
                    .await
                    .map_err(StoreError::connection)?;

                Self::bootstrap_schema(&pool).await?;

                Ok(pool)
            })
            .await
    }

    /// Create-if-absent tables plus the additive column migration.
    /// Every statement is idempotent, so re-running is harmless.
    async fn bootstrap_schema(pool: &PgPool) -> StoreResult<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS links (
                id BIGSERIAL PRIMARY KEY,
                original_url TEXT NOT NULL,
                short_code TEXT NOT NULL UNIQUE,
                creator_ip TEXT,
                preview TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                clicks BIGINT NOT NULL DEFAULT 0
            )",
            "ALTER TABLE links ADD COLUMN IF NOT EXISTS creator_ip TEXT",
            "CREATE TABLE IF NOT EXISTS events (
                id BIGSERIAL PRIMARY KEY,
                short_code TEXT NOT NULL,
                ip TEXT,
                city TEXT,
                country TEXT,
                user_agent TEXT,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT now(),
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION
            )",
            "CREATE INDEX IF NOT EXISTS idx_events_short_code
                ON events (short_code, timestamp DESC)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(StoreError::connection)?;
        }

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn link_from_row(row: &PgRow) -> StoreResult<LinkRecord> {
    let preview: Option<String> = row.try_get("preview").map_err(StoreError::backend)?;
    let preview: PreviewMetadata = preview
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default();

    Ok(LinkRecord {
        original_url: row.try_get("original_url").map_err(StoreError::backend)?,
        short_code: row.try_get("short_code").map_err(StoreError::backend)?,
        creator_ip: row.try_get("creator_ip").map_err(StoreError::backend)?,
        preview,
        created_at: row.try_get("created_at").map_err(StoreError::backend)?,
        clicks: row.try_get("clicks").map_err(StoreError::backend)?,
    })
}

fn event_from_row(row: &PgRow) -> StoreResult<AnalyticsEvent> {
    Ok(AnalyticsEvent {
        short_code: row.try_get("short_code").map_err(StoreError::backend)?,
        ip: row.try_get("ip").map_err(StoreError::backend)?,
        city: row.try_get("city").map_err(StoreError::backend)?,
        country: row.try_get("country").map_err(StoreError::backend)?,
        user_agent: row.try_get("user_agent").map_err(StoreError::backend)?,
        timestamp: row.try_get("timestamp").map_err(StoreError::backend)?,
        latitude: row.try_get("latitude").map_err(StoreError::backend)?,
        longitude: row.try_get("longitude").map_err(StoreError::backend)?,
    })
}

#[async_trait]
impl StorageAdapter for PgAdapter {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&self) -> StoreResult<()> {
        self.pool().await.map(|_| ())
    }

    async fn save_link(&self, link: &LinkRecord) -> StoreResult<()> {
        let preview = serde_json::to_string(&link.preview).map_err(StoreError::backend)?;

        sqlx::query(
            "INSERT INTO links (original_url, short_code, creator_ip, preview, created_at, clicks)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&link.original_url)
        .bind(&link.short_code)
        .bind(&link.creator_ip)
        .bind(&preview)
        .bind(link.created_at)
        .bind(link.clicks)
        .execute(self.pool().await?)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::duplicate(link.short_code.clone())
            } else {
                StoreError::backend(err)
            }
        })?;

        Ok(())
    }

    async fn get_link(&self, short_code: &str) -> StoreResult<Option<LinkRecord>> {
        let row = sqlx::query(
            "SELECT original_url, short_code, creator_ip, preview, created_at, clicks
             FROM links WHERE short_code = $1",
        )
        .bind(short_code)
        .fetch_optional(self.pool().await?)
        .await
        .map_err(StoreError::backend)?;

        row.map(|row| link_from_row(&row)).transpose()
    }

    async fn increment_clicks(&self, short_code: &str) -> StoreResult<()> {
        sqlx::query("UPDATE links SET clicks = clicks + 1 WHERE short_code = $1")
            .bind(short_code)
            .execute(self.pool().await?)
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO events (short_code, ip, city, country, user_agent, timestamp, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&event.short_code)
        .bind(&event.ip)
        .bind(&event.city)
        .bind(&event.country)
        .bind(&event.user_agent)
        .bind(event.timestamp)
        .bind(event.latitude)
        .bind(event.longitude)
        .execute(self.pool().await?)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn get_events(&self, short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        let rows = sqlx::query(
            "SELECT short_code, ip, city, country, user_agent, timestamp, latitude, longitude
             FROM events WHERE short_code = $1
             ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(short_code)
        .bind(EVENT_QUERY_LIMIT as i64)
        .fetch_all(self.pool().await?)
        .await
        .map_err(StoreError::backend)?;

        rows.iter().map(event_from_row).collect()
    }

    async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM links WHERE creator_ip = $1 AND created_at >= $2",
        )
        .bind(ip)
        .bind(since)
        .fetch_one(self.pool().await?)
        .await
        .map_err(StoreError::backend)
    }
}
