//! Solana event indexer.
//!
//! Continuously extracts typed events emitted by two on-chain programs and
//! persists them to a queryable document store. Two emission conventions
//! coexist: the starter program writes structured binary frames
//! (`Program data: <base64>`, Anchor discriminator + borsh payload), the
//! counter program writes only human-readable `Program log:` strings. Both
//! are normalized into a single typed event stream.
//!
//! # Architecture
//!
//! 1. **Ledger RPC** — signatures-for-address pages and full transactions
//! 2. **Codecs** — binary frame decoding or log-line pattern matching
//! 3. **Processor** — common envelope + idempotent persistence
//! 4. **Pipelines** — one checkpointed `poll → fetch → decode → persist`
//!    loop per program, running concurrently
//! 5. **Supervisor** — wiring, startup, graceful shutdown
//!
//! Delivery is at-least-once; the store's unique index on
//! `(signature, event_type, ordinal)` makes re-delivery safe.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use codec::{AnchorEventDecoder, CounterLogParser, EventCodec, ExtractedEvent};
pub use config::{Config, DatabaseType};
pub use indexer::Indexer;
pub use models::{EventEnvelope, EventPayload, EventRecord, EventType};
pub use pipeline::{PipelineState, PipelineStatus, ProgramPipeline};
pub use processor::EventProcessor;
pub use rpc::{LedgerRpc, LedgerTransaction, SignatureRecord, SolanaLedgerRpc};
pub use storage::{EventStore, MongoEventStore, PostgresEventStore, PutOutcome};
pub use utils::error::{IndexerError, Result};

pub mod codec;
pub mod config;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod rpc;
pub mod server;
pub mod storage;
pub mod utils;
