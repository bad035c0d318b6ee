//! Binary event codec for Anchor `Program data:` frames.
//!
//! Each frame is `discriminator(8 bytes) || payload`, base64-encoded in a
//! transaction log line. The discriminator is the first 8 bytes of
//! `SHA-256("event:" + EventName)`; payloads are borsh-encoded
//! (little-endian scalars, 32-byte public keys, `u32`-length-prefixed
//! UTF-8 strings).

use crate::codec::{EventCodec, ExtractedEvent};
use crate::models::{EventPayload, EventType};
use crate::utils::error::{IndexerError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// Log-line prefix that marks a binary event frame.
pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Calculates the 8-byte discriminator for an event name.
///
/// This matches Anchor's event discriminator derivation: the first 8 bytes
/// of the SHA-256 hash of the name prefixed with `event:`.
#[must_use]
pub fn event_discriminator(event_name: &str) -> [u8; 8] {
    let preimage = format!("event:{event_name}");
    let hash = Sha256::digest(preimage.as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// Decoder for the starter program's structured binary events.
///
/// Construction precomputes the discriminator for every known starter event
/// name. Frames whose discriminator is not in the map are skipped, never
/// errors — foreign programs share the same log convention.
pub struct AnchorEventDecoder {
    discriminators: HashMap<[u8; 8], EventType>,
}

impl AnchorEventDecoder {
    #[must_use]
    pub fn new() -> Self {
        let mut discriminators = HashMap::with_capacity(EventType::STARTER_EVENTS.len());
        for event_type in EventType::STARTER_EVENTS {
            discriminators.insert(event_discriminator(event_type.as_str()), event_type);
        }
        Self { discriminators }
    }

    /// Number of event kinds this decoder recognizes.
    #[must_use]
    pub fn known_events(&self) -> usize {
        self.discriminators.len()
    }

    fn decode_payload(event_type: EventType, data: &[u8]) -> Result<EventPayload> {
        let payload = match event_type {
            EventType::TokensMinted => EventPayload::TokensMinted(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::TokensTransferred => EventPayload::TokensTransferred(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::TokensBurned => EventPayload::TokensBurned(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::UserAccountCreated => EventPayload::UserAccountCreated(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::UserAccountUpdated => EventPayload::UserAccountUpdated(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::ConfigUpdated => EventPayload::ConfigUpdated(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            EventType::NftMinted => EventPayload::NftMinted(
                borsh::from_slice(data).map_err(|e| decode_err(event_type, &e))?,
            ),
            other => {
                return Err(IndexerError::DecodingError(format!(
                    "no payload layout for {other}"
                )))
            }
        };
        Ok(payload)
    }
}

impl Default for AnchorEventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_err(event_type: EventType, err: &std::io::Error) -> IndexerError {
    IndexerError::DecodingError(format!("malformed {event_type} payload: {err}"))
}

impl EventCodec for AnchorEventDecoder {
    fn extract(&self, logs: &[String], _account_keys: &[Pubkey]) -> Vec<ExtractedEvent> {
        let mut events = Vec::new();

        for line in logs {
            let Some(encoded) = line.strip_prefix(PROGRAM_DATA_PREFIX) else {
                continue;
            };
            let encoded = encoded.trim();

            let data = match BASE64.decode(encoded) {
                Ok(data) => data,
                Err(err) => {
                    tracing::debug!(%err, "undecodable program data frame");
                    continue;
                }
            };
            if data.len() < 8 {
                tracing::debug!(len = data.len(), "frame shorter than discriminator");
                continue;
            }

            let mut discriminator = [0u8; 8];
            discriminator.copy_from_slice(&data[..8]);
            let Some(&event_type) = self.discriminators.get(&discriminator) else {
                tracing::debug!(
                    discriminator = %BASE64.encode(discriminator),
                    "unknown event discriminator"
                );
                continue;
            };

            match Self::decode_payload(event_type, &data[8..]) {
                Ok(payload) => events.push(ExtractedEvent {
                    event_type,
                    payload,
                    raw: Some(encoded.to_string()),
                }),
                Err(err) => {
                    tracing::debug!(event = %event_type, %err, "dropping undecodable event frame");
                }
            }
        }

        events
    }
}
