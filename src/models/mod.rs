//! Event schema shared by both codecs and the persistent store.
//!
//! Every event the indexer extracts — whether recovered from a binary
//! `Program data:` frame or reconstructed from a `Program log:` line — is
//! normalized into an [`EventRecord`]: a common envelope plus a typed
//! payload. The payload variants are flattened into top-level document
//! fields at persist time, keeping the store schema uniform.

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Closed enumeration of every event kind the indexer understands.
///
/// The serialized name of each variant is the on-chain event name, which is
/// also the preimage of the binary codec's discriminator
/// (`SHA-256("event:" + name)[0..8]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "TokensMintedEvent")]
    TokensMinted,
    #[serde(rename = "TokensTransferredEvent")]
    TokensTransferred,
    #[serde(rename = "TokensBurnedEvent")]
    TokensBurned,
    #[serde(rename = "DelegateApprovedEvent")]
    DelegateApproved,
    #[serde(rename = "DelegateRevokedEvent")]
    DelegateRevoked,
    #[serde(rename = "TokenAccountClosedEvent")]
    TokenAccountClosed,
    #[serde(rename = "TokenAccountFrozenEvent")]
    TokenAccountFrozen,
    #[serde(rename = "TokenAccountThawedEvent")]
    TokenAccountThawed,
    #[serde(rename = "UserAccountCreatedEvent")]
    UserAccountCreated,
    #[serde(rename = "UserAccountUpdatedEvent")]
    UserAccountUpdated,
    #[serde(rename = "UserAccountClosedEvent")]
    UserAccountClosed,
    #[serde(rename = "ConfigUpdatedEvent")]
    ConfigUpdated,
    #[serde(rename = "ProgramPausedEvent")]
    ProgramPaused,
    #[serde(rename = "NftCollectionCreatedEvent")]
    NftCollectionCreated,
    #[serde(rename = "NftMintedEvent")]
    NftMinted,
    #[serde(rename = "NftListedEvent")]
    NftListed,
    #[serde(rename = "NftSoldEvent")]
    NftSold,
    #[serde(rename = "NftListingCancelledEvent")]
    NftListingCancelled,
    #[serde(rename = "NftOfferCreatedEvent")]
    NftOfferCreated,
    #[serde(rename = "NftOfferAcceptedEvent")]
    NftOfferAccepted,
    #[serde(rename = "CounterInitializedEvent")]
    CounterInitialized,
    #[serde(rename = "CounterIncrementedEvent")]
    CounterIncremented,
    #[serde(rename = "CounterDecrementedEvent")]
    CounterDecremented,
    #[serde(rename = "CounterAddedEvent")]
    CounterAdded,
    #[serde(rename = "CounterResetEvent")]
    CounterReset,
    #[serde(rename = "CounterPaymentReceivedEvent")]
    CounterPaymentReceived,
}

impl EventType {
    /// The event kinds emitted as binary frames by the starter program.
    pub const STARTER_EVENTS: [EventType; 20] = [
        EventType::TokensMinted,
        EventType::TokensTransferred,
        EventType::TokensBurned,
        EventType::DelegateApproved,
        EventType::DelegateRevoked,
        EventType::TokenAccountClosed,
        EventType::TokenAccountFrozen,
        EventType::TokenAccountThawed,
        EventType::UserAccountCreated,
        EventType::UserAccountUpdated,
        EventType::UserAccountClosed,
        EventType::ConfigUpdated,
        EventType::ProgramPaused,
        EventType::NftCollectionCreated,
        EventType::NftMinted,
        EventType::NftListed,
        EventType::NftSold,
        EventType::NftListingCancelled,
        EventType::NftOfferCreated,
        EventType::NftOfferAccepted,
    ];

    /// Returns the on-chain event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TokensMinted => "TokensMintedEvent",
            EventType::TokensTransferred => "TokensTransferredEvent",
            EventType::TokensBurned => "TokensBurnedEvent",
            EventType::DelegateApproved => "DelegateApprovedEvent",
            EventType::DelegateRevoked => "DelegateRevokedEvent",
            EventType::TokenAccountClosed => "TokenAccountClosedEvent",
            EventType::TokenAccountFrozen => "TokenAccountFrozenEvent",
            EventType::TokenAccountThawed => "TokenAccountThawedEvent",
            EventType::UserAccountCreated => "UserAccountCreatedEvent",
            EventType::UserAccountUpdated => "UserAccountUpdatedEvent",
            EventType::UserAccountClosed => "UserAccountClosedEvent",
            EventType::ConfigUpdated => "ConfigUpdatedEvent",
            EventType::ProgramPaused => "ProgramPausedEvent",
            EventType::NftCollectionCreated => "NftCollectionCreatedEvent",
            EventType::NftMinted => "NftMintedEvent",
            EventType::NftListed => "NftListedEvent",
            EventType::NftSold => "NftSoldEvent",
            EventType::NftListingCancelled => "NftListingCancelledEvent",
            EventType::NftOfferCreated => "NftOfferCreatedEvent",
            EventType::NftOfferAccepted => "NftOfferAcceptedEvent",
            EventType::CounterInitialized => "CounterInitializedEvent",
            EventType::CounterIncremented => "CounterIncrementedEvent",
            EventType::CounterDecremented => "CounterDecrementedEvent",
            EventType::CounterAdded => "CounterAddedEvent",
            EventType::CounterReset => "CounterResetEvent",
            EventType::CounterPaymentReceived => "CounterPaymentReceivedEvent",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde helper persisting a [`Pubkey`] as its base58 string form.
pub mod pubkey_base58 {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pubkey::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for optional pubkey fields (absent rather than zeroed).
pub mod pubkey_base58_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        key: &Option<Pubkey>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.serialize_some(&key.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Pubkey>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| Pubkey::from_str(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Tokens minted by the starter program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct TokensMinted {
    #[serde(with = "pubkey_base58")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub recipient: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Tokens transferred between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct TokensTransferred {
    #[serde(with = "pubkey_base58")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub from: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub to: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Tokens burned by their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct TokensBurned {
    #[serde(with = "pubkey_base58")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub owner: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// A user account was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct UserAccountCreated {
    #[serde(with = "pubkey_base58")]
    pub user: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub authority: Pubkey,
    pub timestamp: i64,
}

/// A user account's point balance changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct UserAccountUpdated {
    #[serde(with = "pubkey_base58")]
    pub user: Pubkey,
    pub old_points: u64,
    pub new_points: u64,
    pub timestamp: i64,
}

/// The program configuration fee was updated by the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct ConfigUpdated {
    #[serde(with = "pubkey_base58")]
    pub admin: Pubkey,
    pub old_fee: u64,
    pub new_fee: u64,
    pub timestamp: i64,
}

/// An NFT was minted into a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
pub struct NftMinted {
    #[serde(with = "pubkey_base58")]
    pub nft_mint: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub collection: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub owner: Pubkey,
    pub name: String,
    pub uri: String,
    pub timestamp: i64,
}

/// Counter account initialized (reconstructed from program logs).
///
/// The authority is not present in the log line; it is stored as the
/// default (all-zero) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterInitialized {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub authority: Pubkey,
    pub initial_count: u64,
}

/// Counter incremented by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterIncremented {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    pub old_value: u64,
    pub new_value: u64,
}

/// Counter decremented by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDecremented {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    pub old_value: u64,
    pub new_value: u64,
}

/// An arbitrary amount added to the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterAdded {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    pub old_value: u64,
    pub added_value: u64,
    pub new_value: u64,
}

/// Counter reset to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterReset {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    #[serde(with = "pubkey_base58")]
    pub authority: Pubkey,
    pub old_value: u64,
}

/// A paid counter increment.
///
/// The payer and fee collector are mapped from positional transaction
/// accounts and are absent when the transaction carries fewer than three
/// account keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterPaymentReceived {
    #[serde(with = "pubkey_base58")]
    pub counter: Pubkey,
    #[serde(with = "pubkey_base58_opt", skip_serializing_if = "Option::is_none")]
    pub payer: Option<Pubkey>,
    #[serde(with = "pubkey_base58_opt", skip_serializing_if = "Option::is_none")]
    pub fee_collector: Option<Pubkey>,
    pub payment: u64,
    pub new_count: u64,
}

/// Typed event payload, tagged externally by [`EventType`].
///
/// Serialization is untagged: the variant's fields land directly in the
/// persisted document next to the envelope fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    TokensMinted(TokensMinted),
    TokensTransferred(TokensTransferred),
    TokensBurned(TokensBurned),
    UserAccountCreated(UserAccountCreated),
    UserAccountUpdated(UserAccountUpdated),
    ConfigUpdated(ConfigUpdated),
    NftMinted(NftMinted),
    CounterInitialized(CounterInitialized),
    CounterIncremented(CounterIncremented),
    CounterDecremented(CounterDecremented),
    CounterAdded(CounterAdded),
    CounterReset(CounterReset),
    CounterPaymentReceived(CounterPaymentReceived),
}

impl EventPayload {
    /// The event kind this payload belongs to.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::TokensMinted(_) => EventType::TokensMinted,
            EventPayload::TokensTransferred(_) => EventType::TokensTransferred,
            EventPayload::TokensBurned(_) => EventType::TokensBurned,
            EventPayload::UserAccountCreated(_) => EventType::UserAccountCreated,
            EventPayload::UserAccountUpdated(_) => EventType::UserAccountUpdated,
            EventPayload::ConfigUpdated(_) => EventType::ConfigUpdated,
            EventPayload::NftMinted(_) => EventType::NftMinted,
            EventPayload::CounterInitialized(_) => EventType::CounterInitialized,
            EventPayload::CounterIncremented(_) => EventType::CounterIncremented,
            EventPayload::CounterDecremented(_) => EventType::CounterDecremented,
            EventPayload::CounterAdded(_) => EventType::CounterAdded,
            EventPayload::CounterReset(_) => EventType::CounterReset,
            EventPayload::CounterPaymentReceived(_) => EventType::CounterPaymentReceived,
        }
    }
}

/// A fully materialized event ready for persistence.
///
/// The envelope fields are common to every record; the payload is flattened
/// into sibling document fields. `(signature, event_type, ordinal)` is
/// unique in the store, where `ordinal` is the event's 0-based position in
/// the transaction's emitted sequence.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub event_type: EventType,
    pub signature: String,
    pub slot: u64,
    pub ordinal: u32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub block_time: DateTime<Utc>,
    #[serde(with = "pubkey_base58")]
    pub program_id: Pubkey,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub ingested_at: DateTime<Utc>,
    /// Source frame (base64) or log line, retained for audit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// The envelope subset returned by store queries.
///
/// Payload fields present in the document are ignored on read; consumers
/// needing chronological order sort by `block_time` or `(slot, ordinal)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: EventType,
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub ordinal: u32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub block_time: DateTime<Utc>,
    pub program_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub ingested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn sample_record() -> EventRecord {
        EventRecord {
            event_type: EventType::TokensMinted,
            signature: "sig".to_string(),
            slot: 42,
            ordinal: 0,
            block_time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            program_id: Pubkey::new_unique(),
            ingested_at: DateTime::from_timestamp(1_700_000_100, 0).unwrap(),
            raw: None,
            payload: EventPayload::TokensMinted(TokensMinted {
                mint: Pubkey::new_from_array([1; 32]),
                recipient: Pubkey::new_from_array([2; 32]),
                amount: 1000,
                timestamp: 1_700_000_000,
            }),
        }
    }

    #[test]
    fn test_event_type_serializes_as_on_chain_name() {
        let json = serde_json::to_string(&EventType::CounterPaymentReceived).unwrap();
        assert_eq!(json, "\"CounterPaymentReceivedEvent\"");
    }

    #[test]
    fn test_event_type_round_trip() {
        for event_type in EventType::STARTER_EVENTS {
            let json = serde_json::to_string(&event_type).unwrap();
            let back: EventType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event_type);
            assert_eq!(json, format!("\"{}\"", event_type.as_str()));
        }
    }

    #[test]
    fn test_record_flattens_payload_into_document() {
        let record = sample_record();
        let doc = bson::to_document(&record).unwrap();

        assert_eq!(doc.get_str("event_type").unwrap(), "TokensMintedEvent");
        assert_eq!(doc.get_str("signature").unwrap(), "sig");
        // Payload fields are siblings of the envelope, not nested.
        assert_eq!(
            doc.get_str("mint").unwrap(),
            Pubkey::new_from_array([1; 32]).to_string()
        );
        assert_eq!(doc.get_i64("amount").unwrap(), 1000);
        assert!(doc.get("payload").is_none());
        assert!(doc.get("raw").is_none());
    }

    #[test]
    fn test_record_block_time_is_bson_datetime() {
        let doc = bson::to_document(&sample_record()).unwrap();
        assert!(doc.get_datetime("block_time").is_ok());
        assert!(doc.get_datetime("ingested_at").is_ok());
    }

    #[test]
    fn test_payment_without_payer_omits_fields() {
        let payload = EventPayload::CounterPaymentReceived(CounterPaymentReceived {
            counter: Pubkey::new_unique(),
            payer: None,
            fee_collector: None,
            payment: 5_000_000,
            new_count: 7,
        });
        let doc = bson::to_document(&payload).unwrap();
        assert!(doc.get("payer").is_none());
        assert!(doc.get("fee_collector").is_none());
        assert_eq!(doc.get_i64("payment").unwrap(), 5_000_000);
    }

    #[test]
    fn test_envelope_ignores_payload_fields_on_read() {
        let record = sample_record();
        let doc = bson::to_document(&record).unwrap();
        let envelope: EventEnvelope = bson::from_document(doc).unwrap();
        assert_eq!(envelope.event_type, EventType::TokensMinted);
        assert_eq!(envelope.slot, 42);
        assert_eq!(envelope.block_time, record.block_time);
        assert!(envelope.block_time <= envelope.ingested_at);
    }

    #[test]
    fn test_payload_event_type_matches_variant() {
        let record = sample_record();
        assert_eq!(record.payload.event_type(), record.event_type);
    }
}
