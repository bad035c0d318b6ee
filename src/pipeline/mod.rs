//! Per-program polling pipeline: poll → fetch → decode → persist.
//!
//! Each indexed program gets its own pipeline with an isolated cursor (the
//! last processed signature). Pipelines run concurrently and share nothing
//! but the thread-safe store handle.

use crate::codec::EventCodec;
use crate::processor::EventProcessor;
use crate::rpc::{LedgerRpc, SignatureRecord};
use crate::storage::PutOutcome;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Pipeline lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Read-only snapshot of a pipeline's progress, published over a watch
/// channel for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub program: String,
    pub program_id: String,
    pub state: PipelineState,
    pub last_signature: Option<String>,
    pub ticks: u64,
    pub events_persisted: u64,
}

/// One program's checkpointed polling loop.
pub struct ProgramPipeline {
    label: &'static str,
    program_id: Pubkey,
    rpc: Arc<dyn LedgerRpc>,
    codec: Arc<dyn EventCodec>,
    processor: EventProcessor,
    batch_size: usize,
    poll_interval: Duration,
    cursor: RwLock<Option<Signature>>,
    cancel: CancellationToken,
    status_tx: watch::Sender<PipelineStatus>,
    state: Mutex<PipelineState>,
    ticks: AtomicU64,
    events_persisted: AtomicU64,
}

impl ProgramPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: &'static str,
        program_id: Pubkey,
        rpc: Arc<dyn LedgerRpc>,
        codec: Arc<dyn EventCodec>,
        processor: EventProcessor,
        batch_size: usize,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let (status_tx, _) = watch::channel(PipelineStatus {
            program: label.to_string(),
            program_id: program_id.to_string(),
            state: PipelineState::Idle,
            last_signature: None,
            ticks: 0,
            events_persisted: 0,
        });
        Self {
            label,
            program_id,
            rpc,
            codec,
            processor,
            batch_size,
            poll_interval,
            cursor: RwLock::new(None),
            cancel,
            status_tx,
            state: Mutex::new(PipelineState::Idle),
            ticks: AtomicU64::new(0),
            events_persisted: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        *self.state.lock().expect("state lock")
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().expect("state lock") = state;
    }

    /// The cursor: signature of the oldest transaction of the last fully
    /// processed page, used as the `until` bound of the next poll.
    pub async fn last_signature(&self) -> Option<Signature> {
        *self.cursor.read().await
    }

    /// Subscribes to status snapshots.
    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status_tx.subscribe()
    }

    /// Runs the polling loop until cancellation.
    ///
    /// State transitions: idle → running on entry, running → stopping when
    /// the shutdown signal arrives, stopping → stopped once the current
    /// cycle has wound down.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.set_state(PipelineState::Running);
        tracing::info!(
            program = self.label,
            program_id = %self.program_id,
            batch_size = self.batch_size,
            "pipeline started"
        );

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.set_state(PipelineState::Stopping);
                    break;
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(events) if events > 0 => {
                            tracing::info!(program = self.label, events, "tick persisted events");
                        }
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!(
                                program = self.label,
                                %err,
                                "tick failed; window will be retried"
                            );
                        }
                    }
                    self.publish_status().await;
                }
            }
        }

        self.set_state(PipelineState::Stopped);
        self.publish_status().await;
        tracing::info!(program = self.label, "pipeline stopped");
    }

    /// Executes one polling cycle and returns the number of newly persisted
    /// events.
    ///
    /// The cursor advances only after the page is fully processed. Transport
    /// failures abort the cycle with the cursor untouched, so the next tick
    /// re-fetches the same window; the store's uniqueness index absorbs the
    /// re-deliveries.
    ///
    /// # Errors
    ///
    /// Returns transport errors from the page fetch or a mid-page
    /// transaction fetch.
    pub async fn tick(&self) -> Result<u64> {
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let until = self.last_signature().await;
        let page = self
            .rpc
            .signatures_for(&self.program_id, self.batch_size, None, until)
            .await?;

        if page.is_empty() {
            return Ok(0);
        }
        tracing::debug!(program = self.label, page = page.len(), "processing page");

        let mut persisted = 0u64;
        for entry in &page {
            // Shutdown between signatures: stop without advancing the
            // cursor; the unprocessed tail is re-fetched on restart.
            if self.cancel.is_cancelled() {
                return Ok(persisted);
            }

            match self.process_signature(entry).await {
                Ok(events) => persisted += events,
                Err(err) if err.is_transport() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        program = self.label,
                        signature = %entry.signature,
                        %err,
                        "transaction skipped"
                    );
                }
            }
        }

        if let Some(oldest) = page.last() {
            *self.cursor.write().await = Some(oldest.signature);
        }

        Ok(persisted)
    }

    async fn process_signature(&self, entry: &SignatureRecord) -> Result<u64> {
        let Some(tx) = self.rpc.transaction(&entry.signature).await? else {
            tracing::debug!(signature = %entry.signature, "transaction missing or pruned");
            return Ok(0);
        };
        if tx.failed {
            tracing::debug!(signature = %entry.signature, "skipping failed transaction");
            return Ok(0);
        }
        if tx.log_messages.is_empty() {
            return Ok(0);
        }

        let block_time = tx
            .block_time
            .or(entry.block_time)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        let signature = entry.signature.to_string();
        let events = self.codec.extract(&tx.log_messages, &tx.account_keys);

        let mut persisted = 0u64;
        for (ordinal, event) in events.into_iter().enumerate() {
            match self
                .processor
                .process(&signature, tx.slot, block_time, ordinal as u32, event)
                .await
            {
                Ok(PutOutcome::Inserted) => persisted += 1,
                Ok(PutOutcome::Duplicate) => {}
                Err(err) => {
                    tracing::warn!(
                        program = self.label,
                        signature = %signature,
                        ordinal,
                        %err,
                        "failed to persist event"
                    );
                }
            }
        }

        self.events_persisted.fetch_add(persisted, Ordering::Relaxed);
        Ok(persisted)
    }

    async fn publish_status(&self) {
        let last_signature = self.last_signature().await.map(|s| s.to_string());
        self.status_tx.send_replace(PipelineStatus {
            program: self.label.to_string(),
            program_id: self.program_id.to_string(),
            state: self.state(),
            last_signature,
            ticks: self.ticks.load(Ordering::Relaxed),
            events_persisted: self.events_persisted.load(Ordering::Relaxed),
        });
    }
}
