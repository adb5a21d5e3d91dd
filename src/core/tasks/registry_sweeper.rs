// src/core/tasks/registry_sweeper.rs

//! A background task that periodically drops closed entries from the connection registry.

use crate::core::metrics;
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// The background task struct for the registry sweeper.
pub struct RegistrySweeperTask {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl RegistrySweeperTask {
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Runs until the shutdown signal fires, reclaiming closed entries on every tick.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Registry sweeper task started. Sweep interval: {:?}",
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep();
                }
                _ = shutdown_rx.recv() => {
                    info!("Registry sweeper task shutting down.");
                    return;
                }
            }
        }
    }

    /// Performs a single sweep and returns the number of reclaimed entries.
    pub fn sweep(&self) -> usize {
        let reclaimed = self.registry.reclaim();
        if reclaimed > 0 {
            metrics::REGISTRY_RECLAIMED_TOTAL.inc_by(reclaimed as f64);
            debug!("Registry sweeper: reclaimed {} closed connections.", reclaimed);
        }
        reclaimed
    }
}
