//! PostgreSQL event store (alternative backend, schema-only stub).
//!
//! Schema creation mirrors the document shape with the payload in a JSONB
//! column; event persistence and queries are not implemented yet.

use crate::models::{EventEnvelope, EventRecord, EventType};
use crate::storage::{EventStore, PutOutcome};
use crate::utils::error::{IndexerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const SCHEMA_STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS events (
        id SERIAL PRIMARY KEY,
        event_type VARCHAR(100) NOT NULL,
        signature VARCHAR(255) NOT NULL,
        slot BIGINT NOT NULL,
        ordinal INT NOT NULL DEFAULT 0,
        block_time TIMESTAMPTZ NOT NULL,
        program_id VARCHAR(44) NOT NULL,
        ingested_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
        raw TEXT,
        event_data JSONB NOT NULL,
        UNIQUE (signature, event_type, ordinal)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type)",
    "CREATE INDEX IF NOT EXISTS idx_events_block_time ON events(block_time DESC)",
    "CREATE INDEX IF NOT EXISTS idx_events_slot ON events(slot DESC)",
    "CREATE INDEX IF NOT EXISTS idx_events_program_id ON events(program_id)",
];

/// SQL-backed store. Connects and manages schema; writes are unsupported.
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Connects a pool sized by `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::DatabaseError` if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn ensure_indexes(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn put(&self, _record: &EventRecord) -> Result<PutOutcome> {
        Err(IndexerError::StorageUnsupported(
            "postgres event persistence is not implemented yet".to_string(),
        ))
    }

    async fn events_in_range(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>> {
        Err(IndexerError::StorageUnsupported(
            "postgres event queries are not implemented yet".to_string(),
        ))
    }

    async fn events_by_type(
        &self,
        _event_type: EventType,
        _limit: i64,
    ) -> Result<Vec<EventEnvelope>> {
        Err(IndexerError::StorageUnsupported(
            "postgres event queries are not implemented yet".to_string(),
        ))
    }

    async fn events_by_signature(&self, _signature: &str) -> Result<Vec<EventEnvelope>> {
        Err(IndexerError::StorageUnsupported(
            "postgres event queries are not implemented yet".to_string(),
        ))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
