// src/server/listener.rs

//! The seam between the accept loop and whatever produces new connections.

use super::stream::BoxedStream;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// A source of accepted client connections.
#[async_trait]
pub trait Acceptor: Send {
    /// Waits for the next connection. Errors are reported per call; a failed
    /// accept does not mean the acceptor is unusable.
    async fn accept(&mut self) -> io::Result<(BoxedStream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    async fn accept(&mut self) -> io::Result<(BoxedStream, SocketAddr)> {
        let (socket, addr) = TcpListener::accept(self).await?;
        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }
        Ok((Box::new(socket), addr))
    }
}
