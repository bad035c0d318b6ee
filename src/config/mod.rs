//! Environment-driven configuration.
//!
//! All keys come from the process environment (a `.env` file is loaded by
//! the binary before this runs). Validation is strict: a missing required
//! key, an unparseable number, or an out-of-range value fails startup with
//! a descriptive `ConfigError`.

use crate::utils::error::{IndexerError, Result};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    MongoDb,
    Postgres,
}

impl FromStr for DatabaseType {
    type Err = IndexerError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "mongodb" => Ok(DatabaseType::MongoDb),
            "postgres" => Ok(DatabaseType::Postgres),
            other => Err(IndexerError::ConfigError(format!(
                "DATABASE_TYPE must be 'mongodb' or 'postgres', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::MongoDb => f.write_str("mongodb"),
            DatabaseType::Postgres => f.write_str("postgres"),
        }
    }
}

/// Runtime configuration for the indexer process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Solana RPC endpoint URL.
    pub rpc_url: String,
    /// Program emitting structured binary events.
    pub starter_program_id: Pubkey,
    /// Program emitting human-readable log events.
    pub counter_program_id: Pubkey,
    /// Informational starting slot; the cursor itself is signature-based.
    pub start_slot: u64,
    /// Delay between polling cycles.
    pub poll_interval: Duration,
    /// Signatures requested per page.
    pub batch_size: usize,
    /// Sizes the store connection pools.
    pub max_concurrency: u32,
    pub database_type: DatabaseType,
    pub database_url: String,
    pub database_name: String,
    /// Health/status endpoint port.
    pub server_port: u16,
    pub log_level: String,
}

impl Config {
    /// Loads and validates configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::ConfigError` describing the first violated
    /// constraint.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Builds configuration from an arbitrary key lookup (testable seam).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = required(&lookup, "SOLANA_RPC_URL")?;
        let starter_program_id = parse_pubkey(&required(&lookup, "STARTER_PROGRAM_ID")?)?;
        let counter_program_id = parse_pubkey(&required(&lookup, "COUNTER_PROGRAM_ID")?)?;

        let start_slot = parsed_or(&lookup, "START_SLOT", 0u64)?;
        let poll_interval_ms = parsed_or(&lookup, "POLL_INTERVAL_MS", 1000u64)?;
        let batch_size = parsed_or(&lookup, "BATCH_SIZE", 10usize)?;
        let max_concurrency = parsed_or(&lookup, "MAX_CONCURRENCY", 5u32)?;
        let server_port = parsed_or(&lookup, "SERVER_PORT", 8080u32)?;

        let database_type = lookup("DATABASE_TYPE")
            .map(|raw| raw.parse())
            .transpose()?
            .unwrap_or(DatabaseType::MongoDb);
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "mongodb://localhost:27017".to_string());
        let database_name = lookup("DATABASE_NAME").unwrap_or_else(|| "solana_indexer".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        if poll_interval_ms == 0 {
            return Err(IndexerError::ConfigError(
                "POLL_INTERVAL_MS must be positive".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(IndexerError::ConfigError(
                "BATCH_SIZE must be positive".to_string(),
            ));
        }
        if max_concurrency == 0 {
            return Err(IndexerError::ConfigError(
                "MAX_CONCURRENCY must be positive".to_string(),
            ));
        }
        if server_port == 0 || server_port > u32::from(u16::MAX) {
            return Err(IndexerError::ConfigError(
                "SERVER_PORT must be between 1 and 65535".to_string(),
            ));
        }
        if database_url.is_empty() {
            return Err(IndexerError::ConfigError(
                "DATABASE_URL is required".to_string(),
            ));
        }
        if database_name.is_empty() {
            return Err(IndexerError::ConfigError(
                "DATABASE_NAME is required".to_string(),
            ));
        }

        Ok(Self {
            rpc_url,
            starter_program_id,
            counter_program_id,
            start_slot,
            poll_interval: Duration::from_millis(poll_interval_ms),
            batch_size,
            max_concurrency,
            database_type,
            database_url,
            database_name,
            server_port: server_port as u16,
            log_level,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).ok_or_else(|| IndexerError::ConfigError(format!("{key} is required")))
}

fn parse_pubkey(raw: &str) -> Result<Pubkey> {
    Pubkey::from_str(raw)
        .map_err(|e| IndexerError::ConfigError(format!("invalid program ID '{raw}': {e}")))
}

fn parsed_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| IndexerError::ConfigError(format!("invalid {key} '{raw}': {e}"))),
        None => Ok(default),
    }
}
