//! Long-running indexer binary.
//!
//! Exit code 0 on graceful shutdown, non-zero on startup or configuration
//! failure. `SIGINT`/`SIGTERM` trigger graceful shutdown.

use solana_event_indexer::utils::logging;
use solana_event_indexer::{server, Config, Indexer};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);
    logging::log_startup(
        &config.rpc_url,
        &config.starter_program_id.to_string(),
        &config.counter_program_id.to_string(),
        config.poll_interval.as_millis() as u64,
    );

    let server_port = config.server_port;
    let indexer = match Indexer::new(config).await {
        Ok(indexer) => Arc::new(indexer),
        Err(err) => {
            tracing::error!(%err, "failed to initialize indexer");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = indexer.start().await {
        tracing::error!(%err, "failed to start indexer");
        return ExitCode::FAILURE;
    }

    let server = tokio::spawn(server::serve(
        indexer.clone(),
        server_port,
        indexer.shutdown_token(),
    ));

    wait_for_shutdown_signal().await;

    if let Err(err) = indexer.shutdown().await {
        tracing::error!(%err, "shutdown failed");
        return ExitCode::FAILURE;
    }
    if let Ok(Err(err)) = server.await {
        tracing::warn!(%err, "health server exited with error");
    }

    tracing::info!("indexer stopped");
    ExitCode::SUCCESS
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
