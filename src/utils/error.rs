//! Error types for indexer operations.
//!
//! This module defines a comprehensive error enumeration using `thiserror`
//! to provide clear, actionable error reporting throughout the indexer.

use thiserror::Error;

/// Custom error type for indexer operations.
///
/// Covers all failure modes of the indexer, from configuration issues to
/// runtime failures in RPC communication, store operations, and event
/// decoding.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Errors related to configuration.
    ///
    /// This includes missing environment variables, invalid configuration values,
    /// or failures in parsing configuration data. Configuration errors are fatal:
    /// the process exits non-zero at startup.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Errors interacting with the Solana RPC.
    ///
    /// This covers network failures, timeout errors, or unexpected responses
    /// from the Solana RPC endpoint.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Errors from the Solana RPC client.
    #[error("RPC client error: {0}")]
    RpcClientError(Box<solana_client::client_error::ClientError>),

    /// Errors encountered during MongoDB store operations.
    #[error("Store error: {0}")]
    StorageError(#[from] mongodb::error::Error),

    /// Errors encountered during SQL database operations.
    ///
    /// This variant automatically wraps `sqlx::Error` using the `#[from]` attribute,
    /// allowing seamless error propagation with the `?` operator.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// An operation was invoked on a storage backend that does not implement it.
    #[error("Storage operation not supported: {0}")]
    StorageUnsupported(String),

    /// Errors during event decoding.
    ///
    /// This includes failures in deserializing binary event frames or
    /// interpreting program log lines.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Errors from environment variable operations.
    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),

    /// Errors during Solana public key parsing.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] solana_sdk::pubkey::ParsePubkeyError),

    /// Generic errors for operations that don't fit other categories.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IndexerError {
    /// Returns `true` if the failure came from the RPC transport.
    ///
    /// Transport failures abort the current polling cycle without advancing
    /// the pipeline cursor; the same page window is retried on the next tick.
    /// All other errors are per-transaction and never stop a page.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            IndexerError::RpcError(_) | IndexerError::RpcClientError(_)
        )
    }
}

/// Type alias for Results using `IndexerError`.
pub type Result<T> = std::result::Result<T, IndexerError>;

impl From<solana_client::client_error::ClientError> for IndexerError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        IndexerError::RpcClientError(Box::new(err))
    }
}
