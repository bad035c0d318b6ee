//! Thin adapter over the Solana RPC.
//!
//! The pipeline depends on the [`LedgerRpc`] trait, not the concrete
//! client, so tests can substitute a mock provider. This layer promises no
//! retry or backoff — the pipeline's page-retry policy compensates for
//! transport failures.

use crate::utils::error::{IndexerError, Result};
use async_trait::async_trait;
use solana_client::client_error::ClientErrorKind;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcError;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiMessage,
    UiTransactionEncoding,
};

/// One entry of a signatures-for-address page.
#[derive(Debug, Clone)]
pub struct SignatureRecord {
    pub signature: Signature,
    pub slot: u64,
    pub block_time: Option<i64>,
}

/// A fetched transaction, normalized to the fields the codecs consume.
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub log_messages: Vec<String>,
    pub account_keys: Vec<Pubkey>,
    pub failed: bool,
}

/// Read access to the ledger.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Returns the newest-first page of signatures for `program`.
    async fn signatures_for(
        &self,
        program: &Pubkey,
        limit: usize,
        before: Option<Signature>,
        until: Option<Signature>,
    ) -> Result<Vec<SignatureRecord>>;

    /// Fetches a transaction. `None` means the transaction is missing
    /// (pruned or not yet visible) — never an error.
    async fn transaction(&self, signature: &Signature) -> Result<Option<LedgerTransaction>>;
}

/// [`LedgerRpc`] implementation over the nonblocking Solana RPC client.
pub struct SolanaLedgerRpc {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaLedgerRpc {
    #[must_use]
    pub fn new(rpc_url: &str) -> Self {
        Self::new_with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    #[must_use]
    pub fn new_with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
        }
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedgerRpc {
    async fn signatures_for(
        &self,
        program: &Pubkey,
        limit: usize,
        before: Option<Signature>,
        until: Option<Signature>,
    ) -> Result<Vec<SignatureRecord>> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before,
            until,
            limit: Some(limit),
            commitment: Some(self.commitment),
        };

        let statuses = self
            .client
            .get_signatures_for_address_with_config(program, config)
            .await
            .map_err(|e| IndexerError::RpcError(format!("failed to fetch signatures: {e}")))?;

        Ok(statuses
            .into_iter()
            .filter_map(|status| {
                let signature = status.signature.parse().ok()?;
                Some(SignatureRecord {
                    signature,
                    slot: status.slot,
                    block_time: status.block_time,
                })
            })
            .collect())
    }

    async fn transaction(&self, signature: &Signature) -> Result<Option<LedgerTransaction>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        match self
            .client
            .get_transaction_with_config(signature, config)
            .await
        {
            Ok(tx) => Ok(normalize(tx)),
            // The RPC reports a pruned/unknown signature as a user-facing
            // error rather than a transport failure.
            Err(err) if matches!(err.kind, ClientErrorKind::RpcError(RpcError::ForUser(_))) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Flattens the encoded RPC response into a [`LedgerTransaction`].
///
/// Returns `None` when the status meta is absent — the pipeline treats
/// such transactions the same as missing ones.
fn normalize(tx: EncodedConfirmedTransactionWithStatusMeta) -> Option<LedgerTransaction> {
    let meta = tx.transaction.meta?;

    let log_messages = match meta.log_messages {
        OptionSerializer::Some(logs) => logs,
        _ => Vec::new(),
    };
    let failed = meta.err.is_some();

    let account_keys = match &tx.transaction.transaction {
        EncodedTransaction::Json(ui) => match &ui.message {
            UiMessage::Raw(raw) => raw
                .account_keys
                .iter()
                .filter_map(|key| key.parse().ok())
                .collect(),
            UiMessage::Parsed(parsed) => parsed
                .account_keys
                .iter()
                .filter_map(|account| account.pubkey.parse().ok())
                .collect(),
        },
        other => other
            .decode()
            .map(|decoded| decoded.message.static_account_keys().to_vec())
            .unwrap_or_default(),
    };

    Some(LedgerTransaction {
        slot: tx.slot,
        block_time: tx.block_time,
        log_messages,
        account_keys,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_transaction_status::{
        EncodedTransactionWithStatusMeta, UiRawMessage, UiTransaction, UiTransactionStatusMeta,
    };

    fn encoded_tx(
        meta: Option<UiTransactionStatusMeta>,
    ) -> EncodedConfirmedTransactionWithStatusMeta {
        let message = UiMessage::Raw(UiRawMessage {
            header: solana_sdk::message::MessageHeader::default(),
            account_keys: vec![
                Pubkey::new_from_array([7; 32]).to_string(),
                "not a pubkey".to_string(),
            ],
            recent_blockhash: "11111111111111111111111111111111".to_string(),
            instructions: vec![],
            address_table_lookups: None,
        });
        EncodedConfirmedTransactionWithStatusMeta {
            slot: 99,
            transaction: EncodedTransactionWithStatusMeta {
                transaction: EncodedTransaction::Json(UiTransaction {
                    signatures: vec!["sig".to_string()],
                    message,
                }),
                meta,
                version: None,
            },
            block_time: Some(1_700_000_000),
        }
    }

    fn sample_meta(logs: Vec<String>) -> UiTransactionStatusMeta {
        UiTransactionStatusMeta {
            err: None,
            status: Ok(()),
            fee: 5000,
            pre_balances: vec![],
            post_balances: vec![],
            inner_instructions: OptionSerializer::None,
            log_messages: OptionSerializer::Some(logs),
            pre_token_balances: OptionSerializer::None,
            post_token_balances: OptionSerializer::None,
            rewards: OptionSerializer::None,
            loaded_addresses: OptionSerializer::None,
            return_data: OptionSerializer::None,
            compute_units_consumed: OptionSerializer::None,
        }
    }

    #[test]
    fn test_normalize_extracts_logs_and_accounts() {
        let logs = vec!["Program log: hello".to_string()];
        let normalized = normalize(encoded_tx(Some(sample_meta(logs.clone())))).unwrap();
        assert_eq!(normalized.slot, 99);
        assert_eq!(normalized.block_time, Some(1_700_000_000));
        assert_eq!(normalized.log_messages, logs);
        // Unparseable keys are dropped, valid ones kept in order.
        assert_eq!(
            normalized.account_keys,
            vec![Pubkey::new_from_array([7; 32])]
        );
        assert!(!normalized.failed);
    }

    #[test]
    fn test_normalize_missing_meta_is_none() {
        assert!(normalize(encoded_tx(None)).is_none());
    }
}
