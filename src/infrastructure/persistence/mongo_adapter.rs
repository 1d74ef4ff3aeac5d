//! MongoDB implementation of the storage adapter.
//!
//! Links and events live in two collections of one database. The preview
//! metadata is stored natively nested; timestamps use BSON datetimes so
//! range filters and sorts compare chronologically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::datetime::FromChrono04DateTime;
use mongodb::bson::{self, doc};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::domain::entities::{AnalyticsEvent, LinkRecord, PreviewMetadata};
use crate::domain::store::{EVENT_QUERY_LIMIT, StorageAdapter, StoreError, StoreResult};

const DATABASE_NAME: &str = "shortstack";
const LINKS_COLLECTION: &str = "links";
const EVENTS_COLLECTION: &str = "events";

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11_000;

/// Document-store backend addressed by a MongoDB connection URI.
///
/// The client is established once on `connect` and reused; schema bootstrap
/// creates the unique short-code index and the event query index, both
/// idempotent on the server side.
pub struct MongoAdapter {
    uri: String,
    client: OnceCell<Client>,
}

/// Physical link document. Mirrors [`LinkRecord`] with a BSON object id and
/// a BSON datetime so `$gte` filters compare chronologically.
#[derive(Debug, Serialize, Deserialize)]
struct LinkDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    original_url: String,
    short_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creator_ip: Option<String>,
    #[serde(default)]
    preview: PreviewMetadata,
    #[serde(with = "FromChrono04DateTime")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    clicks: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    short_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(with = "FromChrono04DateTime")]
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

impl From<&LinkRecord> for LinkDocument {
    fn from(link: &LinkRecord) -> Self {
        Self {
            id: None,
            original_url: link.original_url.clone(),
            short_code: link.short_code.clone(),
            creator_ip: link.creator_ip.clone(),
            preview: link.preview.clone(),
            created_at: link.created_at,
            clicks: link.clicks,
        }
    }
}

impl From<LinkDocument> for LinkRecord {
    fn from(doc: LinkDocument) -> Self {
        Self {
            original_url: doc.original_url,
            short_code: doc.short_code,
            creator_ip: doc.creator_ip,
            preview: doc.preview,
            created_at: doc.created_at,
            clicks: doc.clicks,
        }
    }
}

impl From<&AnalyticsEvent> for EventDocument {
    fn from(event: &AnalyticsEvent) -> Self {
        Self {
            id: None,
            short_code: event.short_code.clone(),
            ip: event.ip.clone(),
            city: event.city.clone(),
            country: event.country.clone(),
            user_agent: event.user_agent.clone(),
            timestamp: event.timestamp,
            latitude: event.latitude,
            longitude: event.longitude,
        }
    }
}

impl From<EventDocument> for AnalyticsEvent {
    fn from(doc: EventDocument) -> Self {
        Self {
            short_code: doc.short_code,
            ip: doc.ip,
            city: doc.city,
            country: doc.country,
            user_agent: doc.user_agent,
            timestamp: doc.timestamp,
            latitude: doc.latitude,
            longitude: doc.longitude,
        }
    }
}

impl MongoAdapter {
    pub fn new(uri: String) -> Self {
        Self {
            uri,
            client: OnceCell::new(),
        }
    }

    /// Connects on first use; concurrent callers share one attempt.
    async fn client(&self) -> StoreResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = Client::with_uri_str(&self.uri)
                    .await
                    .map_err(StoreError::connection)?;

                client
                    .database(DATABASE_NAME)
                    .run_command(doc! { "ping": 1 })
                    .await
                    .map_err(StoreError::connection)?;

                Self::ensure_indexes(&client).await?;

                Ok(client)
            })
            .await
    }

    /// Index creation is idempotent on the server; repeating it is a no-op.
    async fn ensure_indexes(client: &Client) -> StoreResult<()> {
        let links: Collection<LinkDocument> =
            client.database(DATABASE_NAME).collection(LINKS_COLLECTION);
        links
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "short_code": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .map_err(StoreError::connection)?;

        let events: Collection<EventDocument> = client
            .database(DATABASE_NAME)
            .collection(EVENTS_COLLECTION);
        events
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "short_code": 1, "timestamp": -1 })
                    .build(),
            )
            .await
            .map_err(StoreError::connection)?;

        Ok(())
    }

    async fn links(&self) -> StoreResult<Collection<LinkDocument>> {
        Ok(self
            .client()
            .await?
            .database(DATABASE_NAME)
            .collection(LINKS_COLLECTION))
    }

    async fn events(&self) -> StoreResult<Collection<EventDocument>> {
        Ok(self
            .client()
            .await?
            .database(DATABASE_NAME)
            .collection(EVENTS_COLLECTION))
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl StorageAdapter for MongoAdapter {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&self) -> StoreResult<()> {
        self.client().await.map(|_| ())
    }

    async fn save_link(&self, link: &LinkRecord) -> StoreResult<()> {
        self.links()
            .await?
            .insert_one(LinkDocument::from(link))
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    StoreError::duplicate(link.short_code.clone())
                } else {
                    StoreError::backend(err)
                }
            })?;

        Ok(())
    }

    async fn get_link(&self, short_code: &str) -> StoreResult<Option<LinkRecord>> {
        let doc = self
            .links()
            .await?
            .find_one(doc! { "short_code": short_code })
            .await
            .map_err(StoreError::backend)?;

        Ok(doc.map(LinkRecord::from))
    }

    async fn increment_clicks(&self, short_code: &str) -> StoreResult<()> {
        self.links()
            .await?
            .update_one(
                doc! { "short_code": short_code },
                doc! { "$inc": { "clicks": 1 } },
            )
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn log_event(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        self.events()
            .await?
            .insert_one(EventDocument::from(event))
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn get_events(&self, short_code: &str) -> StoreResult<Vec<AnalyticsEvent>> {
        let cursor = self
            .events()
            .await?
            .find(doc! { "short_code": short_code })
            .sort(doc! { "timestamp": -1 })
            .limit(EVENT_QUERY_LIMIT as i64)
            .await
            .map_err(StoreError::backend)?;

        let docs: Vec<EventDocument> = cursor.try_collect().await.map_err(StoreError::backend)?;

        Ok(docs.into_iter().map(AnalyticsEvent::from).collect())
    }

    async fn count_links_by_ip(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<i64> {
        let count = self
            .links()
            .await?
            .count_documents(doc! {
                "creator_ip": ip,
                "created_at": { "$gte": bson::DateTime::from_chrono(since) },
            })
            .await
            .map_err(StoreError::backend)?;

        Ok(count as i64)
    }
}
