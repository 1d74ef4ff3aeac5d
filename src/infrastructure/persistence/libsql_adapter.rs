//! Remote libSQL implementation of the storage adapter.
//!
//! Talks to a Turso-style database over HTTP, addressed by URL plus auth
//! token. Timestamps are stored as fixed-width RFC 3339 text so range
//! filters and `ORDER BY` compare chronologically; the preview metadata is
//! serialized into a JSON text column.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database, params};
use tokio::sync::OnceCell;

use crate::domain::entities::{AnalyticsEvent, LinkRecord, PreviewMetadata};
use crate::domain::store::{EVENT_QUERY_LIMIT, StorageAdapter, StoreError, StoreResult};

/// Remote SQL backend addressed by URL + auth token.
pub struct LibsqlAdapter {
    url: String,
    auth_token: String,
    db: OnceCell<Database>,
}

impl LibsqlAdapter {
    pub fn new(url: String, auth_token: String) -> Self {
        Self {
            url,
            auth_token,
            db: OnceCell::new(),
        }
    }

    /// Builds the remote handle on first use; concurrent callers share one
    /// attempt. Schema bootstrap runs once per process.
    async fn database(&self) -> StoreResult<&Database> {
        self.db
            .get_or_try_init(|| async {
                let db = Builder::new_remote(self.url.clone(), self.auth_token.clone())
                    .build()
                    .await
                    .map_err(StoreError::connection)?;

                let conn = db.connect().map_err(StoreError::connection)?;
                Self::bootstrap_schema(&conn).await?;

                Ok(db)
            })
            .await
    }

    async fn conn(&self) -> StoreResult<Connection> {
        self.database().await?.connect().map_err(StoreError::backend)
    }

    /// Creates tables and indexes if absent, then applies the additive
    /// column migration. SQLite has no `ADD COLUMN IF NOT EXISTS`, so the
    /// column presence is checked via `pragma_table_info` instead of
    /// catching the backend's "duplicate column" error.
    async fn bootstrap_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_url TEXT NOT NULL,
                short_code TEXT NOT NULL UNIQUE,
                creator_ip TEXT,
                preview TEXT,
                created_at TEXT NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0
            )",
            (),
        )
        .await
        .map_err(StoreError::connection)?;

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM pragma_table_info('links') WHERE name = 'creator_ip'",
                (),
            )
            .await
            .map_err(StoreError::connection)?;
        let has_creator_ip = match rows.next().await.map_err(StoreError::connection)? {
            Some(row) => row.get::<i64>(0).map_err(StoreError::connection)? > 0,
            None => false,
        };
        if !has_creator_ip {
            conn.execute("ALTER TABLE links ADD COLUMN creator_ip TEXT", ())
                .await
                .map_err(StoreError::connection)?;
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL,
                ip TEXT,
                city TEXT,
                country TEXT,
                user_agent TEXT,
                timestamp TEXT NOT NULL,
                latitude REAL,
                longitude REAL
            )",
            (),
        )
        .await
        .map_err(StoreError::connection)?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_short_code ON events (short_code, timestamp)",
            (),
        )
        .await
        .map_err(StoreError::connection)?;

        Ok(())
    }
}

/// Fixed-width RFC 3339 so text comparison matches time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(StoreError::backend)
}

fn decode_preview(raw: Option<String>) -> PreviewMetadata {
    raw.and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

fn is_unique_violation(err: &libsql::Error) -> bool {
    let message = err.to_string();
    message.contains("UNIQUE constraint failed") || message.contains("SQLITE_CONSTRAINT")
}

#[async_trait]
impl StorageAdapter for LibsqlAdapter {
    fn name(&self) -> &'static str {
        "libsql"
    }

    async fn connect(&self) -> StoreResult<()> {
        self.database().await.map(|_| ())
    }

    async fn save_link(&self, link: &LinkRecord) -> StoreResult<()> {
        let preview = serde_json::to_string(&link.preview).map_err(StoreError::backend)?;

        self.conn()
            .await?
            .execute(
                "INSERT INTO links (original_url, short_code, creator_ip, preview, created_at, clicks)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    link.original_url.clone(),
                    link.short_code.clone(),
                    link.creator_ip.clone(),
                    preview,
                    encode_timestamp(link.created_at),
                    link.clicks,
                ],
            )
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
        let mut rows = self
            .conn()
            .await?
            .query(
                "SELECT original_url, short_code, creator_ip, preview, created_at, clicks
                 FROM links WHERE short_code = ?1",
                params![short_code],
            )
            .await
            .map_err(StoreError::backend)?;

        let Some(row) = rows.next().await.map_err(StoreError::backend)? else {
            return Ok(None);
        };

        Ok(Some(LinkRecord {
            original_url: row.get::<String>(0).map_err(StoreError::backend)?,
            short_code: row.get::<String>(1).map_err(StoreError::backend)?,
            creator_ip: row.get::<Option<String>>(2).map_err(StoreError::backend)?,
            preview: decode_preview(row.get::<Option<String>>(3).map_err(StoreError::backend)?),
            created_at: decode_timestamp(&row.get::<String>(4).map_err(StoreError::backend)?)?,
            clicks: row.get::<i64>(5).map_err(StoreError::backend)?,
        }))
    }

    async fn increment_clicks(&self, short_code: &str) -> StoreResult<()> {
        self.conn()
            .await?
            .execute(
                "UPDATE links SET clicks = clicks + 1 WHERE short_code = ?1",
                params![short_code],
            )
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        self.conn()
            .await?
            .execute(
                "INSERT INTO events (short_code, ip, city, country, user_agent, timestamp, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    event.short_code.clone(),
                    event.ip.clone(),
                    event.city.clone(),
                    event.country.clone(),
                    event.user_agent.clone(),
                    encode_timestamp(event.timestamp),
                    event.latitude,
                    event.longitude,
                ],
            )
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn get_events(&self, short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        let mut rows = self
            .conn()
            .await?
            .query(
                "SELECT short_code, ip, city, country, user_agent, timestamp, latitude, longitude
                 FROM events WHERE short_code = ?1
                 ORDER BY timestamp DESC LIMIT ?2",
                params![short_code, EVENT_QUERY_LIMIT as i64],
            )
            .await
            .map_err(StoreError::backend)?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::backend)? {
            events.push(AnalyticsEvent {
                short_code: row.get::<String>(0).map_err(StoreError::backend)?,
                ip: row.get::<Option<String>>(1).map_err(StoreError::backend)?,
                city: row.get::<Option<String>>(2).map_err(StoreError::backend)?,
                country: row.get::<Option<String>>(3).map_err(StoreError::backend)?,
                user_agent: row.get::<Option<String>>(4).map_err(StoreError::backend)?,
                timestamp: decode_timestamp(&row.get::<String>(5).map_err(StoreError::backend)?)?,
                latitude: row.get::<Option<f64>>(6).map_err(StoreError::backend)?,
                longitude: row.get::<Option<f64>>(7).map_err(StoreError::backend)?,
            });
        }

        Ok(events)
    }

    async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<i64> {
        let mut rows = self
            .conn()
            .await?
            .query(
                "SELECT COUNT(*) FROM links WHERE creator_ip = ?1 AND created_at >= ?2",
                params![ip, encode_timestamp(since)],
            )
            .await
            .map_err(StoreError::backend)?;

        match rows.next().await.map_err(StoreError::backend)? {
            Some(row) => row.get::<i64>(0).map_err(StoreError::backend),
            None => Ok(0),
        }
    }
}
