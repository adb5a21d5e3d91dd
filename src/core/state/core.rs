// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::stats::StatsState;
use crate::config::Config;
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;
use std::time::Duration;

/// The state shared by the accept loop and every connection task.
///
/// The registry is held behind its own `Arc` so background tasks and the
/// status server can be handed just the registry.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the server was started with. It never changes at runtime.
    pub config: Config,
    /// The process-wide registry of in-flight connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Counters for connection and session outcomes.
    pub stats: StatsState,
}

impl ServerState {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            stats: StatsState::new(),
        })
    }

    /// The absolute session deadline to arm for each connection, if any.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.config.session_timeout()
    }
}
