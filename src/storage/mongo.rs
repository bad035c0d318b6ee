//! MongoDB-backed event store (primary backend).
//!
//! Events live in a single `events` collection. The compound unique index
//! on `(signature, event_type, ordinal)` is the idempotency barrier:
//! duplicate insert attempts surface as write error 11000 and are absorbed
//! as no-ops.

use crate::models::{EventEnvelope, EventRecord, EventType};
use crate::storage::{EventStore, PutOutcome};
use crate::utils::error::{IndexerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use std::time::Duration;

const EVENTS_COLLECTION: &str = "events";

/// Document store for indexed events.
pub struct MongoEventStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoEventStore {
    /// Connects to MongoDB and verifies the server responds to a ping.
    ///
    /// `max_pool_size` bounds concurrent store operations across pipelines.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::StorageError` if the URI is invalid or the
    /// server is unreachable.
    pub async fn connect(uri: &str, db_name: &str, max_pool_size: u32) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.max_pool_size = Some(max_pool_size);
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        let collection = client
            .database(db_name)
            .collection::<Document>(EVENTS_COLLECTION);

        Ok(Self { client, collection })
    }

    fn envelopes(&self) -> Collection<EventEnvelope> {
        self.collection.clone_with_type::<EventEnvelope>()
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().all(|e| e.code == 11000)),
        _ => false,
    }
}

#[async_trait]
impl EventStore for MongoEventStore {
    async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexModel::builder()
            .keys(doc! { "signature": 1, "event_type": 1, "ordinal": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let secondary = [
            doc! { "event_type": 1 },
            doc! { "block_time": -1 },
            doc! { "slot": -1 },
            doc! { "program_id": 1 },
        ]
        .into_iter()
        .map(|keys| IndexModel::builder().keys(keys).build());

        self.collection
            .create_indexes(std::iter::once(unique).chain(secondary), None)
            .await?;
        Ok(())
    }

    async fn put(&self, record: &EventRecord) -> Result<PutOutcome> {
        let document = bson::to_document(record)
            .map_err(|e| IndexerError::InternalError(format!("serialize event record: {e}")))?;

        match self.collection.insert_one(document, None).await {
            Ok(_) => Ok(PutOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(PutOutcome::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    async fn events_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>> {
        let filter = doc! {
            "block_time": {
                "$gte": bson::DateTime::from_chrono(from),
                "$lte": bson::DateTime::from_chrono(to),
            }
        };
        let cursor = self.envelopes().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn events_by_type(
        &self,
        event_type: EventType,
        limit: i64,
    ) -> Result<Vec<EventEnvelope>> {
        let options = FindOptions::builder()
            .sort(doc! { "block_time": -1 })
            .limit(limit)
            .build();
        let cursor = self
            .envelopes()
            .find(doc! { "event_type": event_type.as_str() }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn events_by_signature(&self, signature: &str) -> Result<Vec<EventEnvelope>> {
        let cursor = self
            .envelopes()
            .find(doc! { "signature": signature }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
