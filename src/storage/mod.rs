//! Persistent event stores.
//!
//! The primary backend is MongoDB; a PostgreSQL stub exists behind the same
//! trait and is selected by configuration. All backends must be safe for
//! concurrent `put` from multiple pipelines.

pub mod mongo;
pub mod postgres;

pub use mongo::MongoEventStore;
pub use postgres::PostgresEventStore;

use crate::models::{EventEnvelope, EventRecord, EventType};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of an insert attempt.
///
/// A duplicate on the `(signature, event_type, ordinal)` uniqueness index is
/// not an error: the page-retry policy re-delivers transactions after
/// transport failures, and the index is what makes at-least-once delivery
/// safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Duplicate,
}

/// Append-only event collection with envelope queries.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Idempotently creates the uniqueness index and the secondary indexes
    /// on `event_type`, `block_time desc`, `slot desc`, and `program_id`.
    async fn ensure_indexes(&self) -> Result<()>;

    /// Inserts one event record. Duplicate-key conflicts are absorbed and
    /// reported as [`PutOutcome::Duplicate`].
    async fn put(&self, record: &EventRecord) -> Result<PutOutcome>;

    /// Events whose `block_time` falls within `[from, to]`.
    async fn events_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>>;

    /// Most recent events of one kind, descending `block_time`.
    async fn events_by_type(
        &self,
        event_type: EventType,
        limit: i64,
    ) -> Result<Vec<EventEnvelope>>;

    /// Every event materialized from one transaction.
    async fn events_by_signature(&self, signature: &str) -> Result<Vec<EventEnvelope>>;

    /// Drains and releases connections. Called exactly once at shutdown.
    async fn close(&self) -> Result<()>;
}
