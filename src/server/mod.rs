//! Health and status endpoints.

use crate::indexer::Indexer;
use crate::pipeline::PipelineStatus;
use crate::utils::error::{IndexerError, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// Indexer status response.
#[derive(Debug, Serialize)]
struct StatusResponse {
    running: bool,
    pipelines: Vec<PipelineStatus>,
}

/// `GET /health` — service liveness.
async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /status` — pipeline cursors and counters.
async fn status_handler(State(indexer): State<Arc<Indexer>>) -> impl IntoResponse {
    Json(StatusResponse {
        running: indexer.is_running(),
        pipelines: indexer.status(),
    })
}

/// Builds the service router.
pub fn router(indexer: Arc<Indexer>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .with_state(indexer)
}

/// Serves the router until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(indexer: Arc<Indexer>, port: u16, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| IndexerError::InternalError(format!("bind port {port}: {e}")))?;

    tracing::info!(port, "health server listening");

    axum::serve(listener, router(indexer))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| IndexerError::InternalError(format!("health server: {e}")))
}
