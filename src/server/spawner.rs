// src/server/spawner.rs

//! Spawns the server's long-running background tasks.

use super::context::ServerContext;
use super::status_server;
use crate::core::tasks::registry_sweeper::RegistrySweeperTask;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
///
/// The status listener is bound here, before spawning, so a bind failure is
/// reported as a startup error.
pub async fn spawn_all(ctx: &mut ServerContext) -> Result<()> {
    let state = &ctx.state;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Registry Sweeper ---
    let sweeper = RegistrySweeperTask::new(state.registry.clone(), state.config.sweeper.interval);
    let shutdown_rx_sweeper = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        sweeper.run(shutdown_rx_sweeper).await;
        Ok(())
    });

    // --- Status Server ---
    if state.config.status.enabled {
        let status_addr = state.config.status.listen_addr();
        let listener = TcpListener::bind(&status_addr)
            .await
            .with_context(|| format!("Failed to bind status server on {status_addr}"))?;
        info!("Status server listening on http://{}/", status_addr);

        let registry = state.registry.clone();
        let shutdown_rx_status = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            status_server::run_status_server(listener, registry, shutdown_rx_status).await
        });
    } else {
        info!("Status server is disabled in the configuration.");
    }

    info!("All background tasks have been spawned.");
    Ok(())
}
