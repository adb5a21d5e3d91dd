// src/server/connection_loop.rs

//! Contains the main loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use super::listener::Acceptor;
use crate::connection::ConnectionHandler;
use crate::core::errors::SessionError;
use crate::core::metrics;
use crate::core::socks::SessionEngine;
use crate::core::state::ServerState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// The main server loop: accepts until SIGINT/SIGTERM or a background task dies,
/// then shuts everything down.
pub async fn run(ctx: ServerContext) -> anyhow::Result<()> {
    let ServerContext {
        state,
        listener,
        engine,
        shutdown_tx,
        mut background_tasks,
    } = ctx;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let stop = async {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
            Some(res) = background_tasks.join_next() => match res {
                Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                Ok(Err(e)) => error!("CRITICAL: Background task failed: {}. Shutting down.", e),
                Err(e) => error!("CRITICAL: Background task panicked: {e:?}. Shutting down."),
            },
        }
    };

    serve_connections(listener, state.clone(), engine, stop).await;

    info!("Shutting down. Sending signal to all tasks.");
    if shutdown_tx.send(()).is_err() {
        debug!("No background task was listening for the shutdown signal.");
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    }
    info!(
        "Server shutdown complete. {} connections served, {} sessions failed.",
        state.stats.get_total_connections(),
        state.stats.get_failed_sessions()
    );
    Ok(())
}

/// Accepts connections from `acceptor` until `shutdown` resolves.
///
/// Each connection is registered, then served on its own task. Accept errors
/// are logged and the loop keeps going. When `shutdown` resolves, in-flight
/// sessions are aborted; their registry entries are closed as their tasks drop.
pub async fn serve_connections<A, F>(
    mut acceptor: A,
    state: Arc<ServerState>,
    engine: Arc<dyn SessionEngine>,
    shutdown: F,
) where
    A: Acceptor,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut client_tasks = JoinSet::new();
    let session_timeout = state.session_timeout();

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            Some(res) = client_tasks.join_next() => log_task_outcome(res),

            res = acceptor.accept() => match res {
                Ok((stream, addr)) => {
                    info!("Accepted new connection from: {}", addr);
                    state.stats.increment_total_connections();
                    metrics::CONNECTIONS_RECEIVED_TOTAL.inc();

                    let handler = ConnectionHandler::new(
                        stream,
                        addr,
                        state.registry.clone(),
                        engine.clone(),
                        session_timeout,
                    );
                    let task_state = state.clone();
                    client_tasks.spawn(async move {
                        match handler.run().await {
                            Ok(summary) => debug!(
                                "Session from {} to {} finished ({} bytes up, {} bytes down).",
                                addr, summary.target, summary.bytes_sent, summary.bytes_received
                            ),
                            Err(e) => record_session_failure(&task_state, addr, &e),
                        }
                    });
                    reap_finished(&mut client_tasks);
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    metrics::ACCEPT_ERRORS_TOTAL.inc();
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }

    client_tasks.shutdown().await;
    info!("All client connections closed.");
}

/// Collects every already-finished session task without waiting, so the set
/// stays bounded by the number of live sessions while accepts keep coming.
fn reap_finished(client_tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(res) = client_tasks.try_join_next() {
        log_task_outcome(res);
        reaped += 1;
    }
    reaped
}

fn log_task_outcome(res: Result<(), JoinError>) {
    if let Err(e) = res
        && e.is_panic()
    {
        error!("A connection handler panicked: {e:?}");
    }
}

fn record_session_failure(state: &ServerState, addr: std::net::SocketAddr, e: &SessionError) {
    state.stats.increment_failed_sessions();
    metrics::SESSION_FAILURES_TOTAL.inc();
    match e {
        SessionError::DeadlineExceeded => {
            state.stats.increment_expired_sessions();
            info!("Session from {} hit its deadline and was closed.", addr);
        }
        e if e.is_normal_disconnect() => debug!("Connection from {} closed by peer: {}", addr, e),
        e => warn!("Connection from {} terminated unexpectedly: {}", addr, e),
    }
}
