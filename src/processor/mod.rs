//! Wraps extracted events in the common envelope and persists them.

use crate::codec::ExtractedEvent;
use crate::models::EventRecord;
use crate::storage::{EventStore, PutOutcome};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Stateless event processor bound to one program identity.
///
/// Safe to invoke concurrently from multiple pipelines — each pipeline
/// holds its own clone with its own `program_id`.
#[derive(Clone)]
pub struct EventProcessor {
    store: Arc<dyn EventStore>,
    program_id: Pubkey,
}

impl EventProcessor {
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, program_id: Pubkey) -> Self {
        Self { store, program_id }
    }

    /// Envelopes one extracted event and hands it to the store.
    ///
    /// `ordinal` is the event's 0-based position within the transaction's
    /// emitted sequence. Duplicate-key conflicts are absorbed as success.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the caller logs them and continues with
    /// the rest of the transaction.
    pub async fn process(
        &self,
        signature: &str,
        slot: u64,
        block_time: DateTime<Utc>,
        ordinal: u32,
        event: ExtractedEvent,
    ) -> Result<PutOutcome> {
        let record = EventRecord {
            event_type: event.event_type,
            signature: signature.to_string(),
            slot,
            ordinal,
            block_time,
            program_id: self.program_id,
            ingested_at: Utc::now(),
            raw: event.raw,
            payload: event.payload,
        };

        let outcome = self.store.put(&record).await?;
        if outcome == PutOutcome::Duplicate {
            tracing::debug!(
                signature,
                event_type = %record.event_type,
                ordinal,
                "duplicate event absorbed"
            );
        }
        Ok(outcome)
    }
}
