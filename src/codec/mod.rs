//! Event extraction from transaction log messages.
//!
//! Two emission conventions coexist on chain: the starter program emits
//! structured binary frames (`Program data: <base64>`), the counter program
//! emits only human-readable `Program log:` strings. Each convention gets
//! its own codec behind the [`EventCodec`] trait; both feed the same typed
//! event stream. Adding a third program means adding a third codec — the
//! processor and store are untouched.

pub mod anchor;
pub mod counter;

pub use anchor::AnchorEventDecoder;
pub use counter::CounterLogParser;

use crate::models::{EventPayload, EventType};
use solana_sdk::pubkey::Pubkey;

/// One event recovered from a transaction's log sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEvent {
    pub event_type: EventType,
    pub payload: EventPayload,
    /// Source frame (base64) or log line, retained for audit.
    pub raw: Option<String>,
}

/// Extracts typed events from a transaction's log messages.
///
/// Extraction never fails the batch: unrecognized, malformed, or truncated
/// input is skipped with a debug log. Emitted events follow log-line order.
pub trait EventCodec: Send + Sync {
    fn extract(&self, logs: &[String], account_keys: &[Pubkey]) -> Vec<ExtractedEvent>;
}
