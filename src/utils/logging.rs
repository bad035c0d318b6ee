//! Tracing subscriber setup and startup logging.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber (singleton, called once).
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to
/// `default_level`. Safe to call multiple times — subsequent calls are
/// no-ops.
pub fn init(default_level: &str) {
    let default_level = default_level.to_string();
    LOGGING_INIT.get_or_init(move || {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&default_level));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .init();
    });
}

/// Logs indexer startup information with the RPC URL sanitized.
pub fn log_startup(
    rpc_url: &str,
    starter_program: &str,
    counter_program: &str,
    poll_interval_ms: u64,
) {
    tracing::info!(
        rpc_url = sanitize_rpc_url(rpc_url),
        starter_program,
        counter_program,
        poll_interval_ms,
        "Solana event indexer startup"
    );
}

/// Redacts an `api-key=` query value so provider keys never reach the logs.
#[must_use]
pub fn sanitize_rpc_url(rpc_url: &str) -> String {
    let Some(pos) = rpc_url.find("api-key=") else {
        return rpc_url.to_string();
    };
    let before = &rpc_url[..pos + 8];
    let after = &rpc_url[pos + 8..];
    let end_pos = after.find('&').unwrap_or(after.len());
    format!("{before}[REDACTED]{}", &after[end_pos..])
}
