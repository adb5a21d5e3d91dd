// src/server/initialization.rs

//! Handles server initialization: state, protocol engine and the SOCKS5 listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::socks::{Socks5Engine, StaticCredentials};
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
/// Any failure here is fatal.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let credentials = StaticCredentials::new(config.login.clone(), config.password.clone());
    let engine = Arc::new(Socks5Engine::new(credentials));
    info!("SOCKS5 engine initialized with username/password authentication.");

    let listen_addr = config.listen_addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind SOCKS5 listener on {listen_addr}"))?;
    info!("Pupok proxy listening on {}", listen_addr);

    let state = ServerState::new(config);

    Ok(ServerContext {
        state,
        listener,
        engine,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    match config.session_timeout() {
        Some(timeout) => info!("Session deadline set to {:?} per connection.", timeout),
        None => warn!("No session deadline configured. Sessions may live indefinitely."),
    }
    info!(
        "Registry sweep interval: {:?}.",
        config.sweeper.interval
    );
}
