//! Log-message parser for the counter program.
//!
//! The counter program emits no structured frames — only human-readable
//! `Program log:` strings. This parser matches a closed set of message
//! patterns, parses the numeric fields, and maps positional transaction
//! accounts onto the event (`counter = accounts[0]`, and for payments
//! `payer = accounts[1]`, `fee_collector = accounts[2]`).
//!
//! Old values are reconstructed arithmetically from the logged new value;
//! on underflow the missing side clamps to zero.

use crate::codec::{EventCodec, ExtractedEvent};
use crate::models::{
    CounterAdded, CounterDecremented, CounterIncremented, CounterInitialized,
    CounterPaymentReceived, CounterReset, EventPayload, EventType,
};
use regex::Regex;
use solana_sdk::pubkey::Pubkey;

/// Log-line prefix that marks a program's own log output.
pub const PROGRAM_LOG_PREFIX: &str = "Program log: ";

const INCREMENTED_PREFIX: &str = "Counter incremented to: ";
const DECREMENTED_PREFIX: &str = "Counter decremented to: ";

/// Parses counter program events out of free-text log lines.
pub struct CounterLogParser {
    added_re: Regex,
    payment_re: Regex,
}

impl CounterLogParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            added_re: Regex::new(r"^Added (\d+) to counter\. New value: (\d+)$")
                .expect("added pattern is valid"),
            payment_re: Regex::new(
                r"^Payment of (\d+) lamports received\. Counter incremented to: (\d+)$",
            )
            .expect("payment pattern is valid"),
        }
    }

    fn parse_line(&self, line: &str, accounts: &[Pubkey]) -> Option<ExtractedEvent> {
        let (_, msg) = line.split_once(PROGRAM_LOG_PREFIX)?;
        let msg = msg.trim();

        // Every pattern maps the counter account from position 0; a
        // transaction without account keys cannot produce an event.
        let counter = accounts.first().copied()?;

        let (event_type, payload) = if msg == "Counter initialized" {
            (
                EventType::CounterInitialized,
                EventPayload::CounterInitialized(CounterInitialized {
                    counter,
                    authority: Pubkey::default(),
                    initial_count: 0,
                }),
            )
        } else if let Some(rest) = msg.strip_prefix(INCREMENTED_PREFIX) {
            let new_value = parse_u64(rest)?;
            (
                EventType::CounterIncremented,
                EventPayload::CounterIncremented(CounterIncremented {
                    counter,
                    old_value: new_value.saturating_sub(1),
                    new_value,
                }),
            )
        } else if let Some(rest) = msg.strip_prefix(DECREMENTED_PREFIX) {
            let new_value = parse_u64(rest)?;
            (
                EventType::CounterDecremented,
                EventPayload::CounterDecremented(CounterDecremented {
                    counter,
                    old_value: new_value.saturating_add(1),
                    new_value,
                }),
            )
        } else if let Some(captures) = self.added_re.captures(msg) {
            let added_value = parse_u64(&captures[1])?;
            let new_value = parse_u64(&captures[2])?;
            (
                EventType::CounterAdded,
                EventPayload::CounterAdded(CounterAdded {
                    counter,
                    old_value: new_value.saturating_sub(added_value),
                    added_value,
                    new_value,
                }),
            )
        } else if msg == "Counter reset" {
            (
                EventType::CounterReset,
                EventPayload::CounterReset(CounterReset {
                    counter,
                    authority: Pubkey::default(),
                    old_value: 0,
                }),
            )
        } else if let Some(captures) = self.payment_re.captures(msg) {
            let payment = parse_u64(&captures[1])?;
            let new_count = parse_u64(&captures[2])?;
            (
                EventType::CounterPaymentReceived,
                EventPayload::CounterPaymentReceived(CounterPaymentReceived {
                    counter,
                    payer: accounts.get(1).copied(),
                    fee_collector: accounts.get(2).copied(),
                    payment,
                    new_count,
                }),
            )
        } else {
            return None;
        };

        Some(ExtractedEvent {
            event_type,
            payload,
            raw: Some(line.to_string()),
        })
    }
}

impl Default for CounterLogParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_u64(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

impl EventCodec for CounterLogParser {
    fn extract(&self, logs: &[String], account_keys: &[Pubkey]) -> Vec<ExtractedEvent> {
        logs.iter()
            .filter_map(|line| self.parse_line(line, account_keys))
            .collect()
    }
}
