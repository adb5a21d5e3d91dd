// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod spawner;
pub mod listener;
pub mod status_server;
pub mod stream;

pub use connection_loop::serve_connections;
pub use listener::Acceptor;
pub use stream::BoxedStream;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Build state, the protocol engine and the SOCKS5 listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn the sweeper and the status server.
    spawner::spawn_all(&mut server_context).await?;

    // 3. Accept connections until shutdown.
    connection_loop::run(server_context).await
}
