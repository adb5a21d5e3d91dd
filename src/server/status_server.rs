// src/server/status_server.rs

//! A small HTTP server exposing the registry's active connections and Prometheus metrics.

use crate::core::metrics::gather_metrics;
use crate::core::registry::ConnectionRegistry;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Builds the status router around a registry handle.
pub fn router(registry: Arc<ConnectionRegistry>) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

/// Lists every active address, one per line. Always 200.
async fn status_handler(State(registry): State<Arc<ConnectionRegistry>>) -> impl IntoResponse {
    let body = render_active(registry.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        body,
    )
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Renders addresses sorted, newline-terminated. No addresses yields an empty body.
pub fn render_active(mut addrs: Vec<String>) -> String {
    addrs.sort_unstable();
    let mut body = String::with_capacity(addrs.iter().map(|a| a.len() + 1).sum());
    for addr in addrs {
        body.push_str(&addr);
        body.push('\n');
    }
    body
}

/// Serves the status router on `listener` until the shutdown signal fires.
pub async fn run_status_server(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("Status server shutting down.");
        })
        .await
        .context("Status server failed")
}
