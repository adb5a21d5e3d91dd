// src/connection/handler.rs

//! Defines the `ConnectionHandler` which drives one connection through
//! register -> (deadline) -> delegate -> unregister.

use super::guard::RegistrationGuard;
use crate::core::errors::SessionError;
use crate::core::registry::ConnectionRegistry;
use crate::core::socks::{SessionEngine, SessionSummary};
use crate::server::stream::BoxedStream;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Owns one accepted connection for its whole lifetime.
pub struct ConnectionHandler {
    stream: BoxedStream,
    addr: SocketAddr,
    engine: Arc<dyn SessionEngine>,
    deadline: Option<Instant>,
    guard: RegistrationGuard,
}

impl ConnectionHandler {
    /// Creates the handler and registers the connection as active right away,
    /// before any protocol work can start.
    ///
    /// The session deadline, if any, is fixed here at `now + session_timeout`.
    /// A timeout too large to be represented as an instant means no deadline.
    pub fn new(
        stream: BoxedStream,
        addr: SocketAddr,
        registry: Arc<ConnectionRegistry>,
        engine: Arc<dyn SessionEngine>,
        session_timeout: Option<Duration>,
    ) -> Self {
        let guard = RegistrationGuard::register(registry, addr.to_string());
        let deadline = session_timeout.and_then(|timeout| {
            let deadline = Instant::now().checked_add(timeout);
            if deadline.is_none() {
                warn!("Session timeout {:?} is out of range; {} runs without a deadline.", timeout, addr);
            }
            deadline
        });
        Self {
            stream,
            addr,
            engine,
            deadline,
            guard,
        }
    }

    /// Hands the connection to the engine and waits for the session to end.
    ///
    /// With a deadline armed, the engine call is bounded by it; on expiry the
    /// session future is dropped, which closes the socket. The registry entry is marked closed
    /// when the guard drops at the end of this call, whatever the outcome.
    pub async fn run(self) -> Result<SessionSummary, SessionError> {
        let Self {
            stream,
            addr,
            engine,
            deadline,
            guard,
        } = self;

        let session = engine.serve_session(stream, addr);
        let result = match deadline {
            Some(deadline) => {
                debug!(
                    "Session deadline for {} armed, {:?} left",
                    addr,
                    deadline.saturating_duration_since(Instant::now())
                );
                match tokio::time::timeout_at(deadline, session).await {
                    Ok(result) => result,
                    Err(_) => Err(SessionError::DeadlineExceeded),
                }
            }
            None => session.await,
        };

        drop(guard);
        result
    }
}
