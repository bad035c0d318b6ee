//! Supervisor: wires components, runs the pipelines, owns shutdown.

use crate::codec::{AnchorEventDecoder, CounterLogParser};
use crate::config::{Config, DatabaseType};
use crate::models::EventType;
use crate::pipeline::{PipelineStatus, ProgramPipeline};
use crate::processor::EventProcessor;
use crate::rpc::{LedgerRpc, SolanaLedgerRpc};
use crate::storage::{EventStore, MongoEventStore, PostgresEventStore};
use crate::utils::error::{IndexerError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Top-level orchestrator.
///
/// Owns the store, the RPC client, and one [`ProgramPipeline`] per indexed
/// program. Pipelines run as independent tasks; cancellation propagates
/// from the supervisor's root token and `shutdown` closes the store exactly
/// once.
pub struct Indexer {
    config: Config,
    store: Arc<dyn EventStore>,
    pipelines: Vec<Arc<ProgramPipeline>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
    shutdown_started: AtomicBool,
}

impl Indexer {
    /// Connects the configured store and wires both pipelines.
    ///
    /// # Errors
    ///
    /// Returns an error if the store connection fails; store-open errors
    /// are fatal at startup.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn EventStore> = match config.database_type {
            DatabaseType::MongoDb => Arc::new(
                MongoEventStore::connect(
                    &config.database_url,
                    &config.database_name,
                    config.max_concurrency,
                )
                .await?,
            ),
            DatabaseType::Postgres => Arc::new(
                PostgresEventStore::connect(&config.database_url, config.max_concurrency).await?,
            ),
        };
        let rpc: Arc<dyn LedgerRpc> = Arc::new(SolanaLedgerRpc::new(&config.rpc_url));

        Ok(Self::with_components(config, store, rpc))
    }

    /// Wires an indexer over externally constructed components.
    ///
    /// This is the seam integration tests use to substitute a mock ledger
    /// and an in-memory store.
    #[must_use]
    pub fn with_components(
        config: Config,
        store: Arc<dyn EventStore>,
        rpc: Arc<dyn LedgerRpc>,
    ) -> Self {
        let cancel = CancellationToken::new();

        let starter = ProgramPipeline::new(
            "starter",
            config.starter_program_id,
            rpc.clone(),
            Arc::new(AnchorEventDecoder::new()),
            EventProcessor::new(store.clone(), config.starter_program_id),
            config.batch_size,
            config.poll_interval,
            cancel.child_token(),
        );
        let counter = ProgramPipeline::new(
            "counter",
            config.counter_program_id,
            rpc,
            Arc::new(CounterLogParser::new()),
            EventProcessor::new(store.clone(), config.counter_program_id),
            config.batch_size,
            config.poll_interval,
            cancel.child_token(),
        );

        Self {
            config,
            store,
            pipelines: vec![Arc::new(starter), Arc::new(counter)],
            cancel,
            tasks: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            shutdown_started: AtomicBool::new(false),
        }
    }

    /// Ensures store indexes exist, then starts every pipeline task.
    ///
    /// # Errors
    ///
    /// Returns an error if the indexer is already running, has been shut
    /// down, or index creation fails.
    pub async fn start(&self) -> Result<()> {
        if self.shutdown_started.load(Ordering::SeqCst) {
            return Err(IndexerError::InternalError(
                "indexer has been shut down".to_string(),
            ));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IndexerError::InternalError(
                "indexer is already running".to_string(),
            ));
        }

        if let Err(err) = self.store.ensure_indexes().await {
            self.running.store(false, Ordering::SeqCst);
            return Err(err);
        }

        tracing::info!(
            starter_program = %self.config.starter_program_id,
            counter_program = %self.config.counter_program_id,
            start_slot = self.config.start_slot,
            "starting indexer"
        );

        let mut tasks = self.tasks.lock().await;
        for pipeline in &self.pipelines {
            let pipeline = pipeline.clone();
            tasks.push(tokio::spawn(async move { pipeline.run().await }));
        }
        Ok(())
    }

    /// Gracefully stops the pipelines and closes the store.
    ///
    /// Idempotent: the first call cancels and closes, subsequent calls are
    /// no-ops. After shutdown, [`Indexer::is_running`] stays `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the store fails.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let was_running = self.running.swap(false, Ordering::SeqCst);

        tracing::info!("shutting down indexer");
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            if let Err(err) = task.await {
                tracing::warn!(%err, "pipeline task join failed");
            }
        }

        if was_running {
            self.store.close().await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Child token observers can use to follow the indexer's lifetime.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Informational starting slot from configuration.
    #[must_use]
    pub fn start_slot(&self) -> u64 {
        self.config.start_slot
    }

    /// Latest status snapshot of every pipeline.
    #[must_use]
    pub fn status(&self) -> Vec<PipelineStatus> {
        self.pipelines
            .iter()
            .map(|pipeline| pipeline.subscribe_status().borrow().clone())
            .collect()
    }

    /// Counts stored events per type within a `block_time` window.
    ///
    /// # Errors
    ///
    /// Propagates store query failures.
    pub async fn event_stats(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<HashMap<EventType, u64>> {
        let mut stats = HashMap::new();
        for envelope in self.store.events_in_range(from, to).await? {
            *stats.entry(envelope.event_type).or_insert(0) += 1;
        }
        Ok(stats)
    }
}
