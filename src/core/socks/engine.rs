// src/core/socks/engine.rs

//! The protocol engine seam and the bundled SOCKS5 implementation.

use super::credentials::StaticCredentials;
use super::protocol::{
    self, AUTH_FAILURE, AUTH_SUCCESS, AuthMethod, Command, ReplyCode, TargetAddr,
};
use crate::core::errors::SessionError;
use crate::server::stream::BoxedStream;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// How long an outbound CONNECT may take before the client gets a TTL-expired reply.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a successfully completed session did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub target: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Runs one complete proxy session over an accepted stream.
///
/// The call returns only when the session is over, whatever the reason.
/// Implementations must not touch the connection registry.
#[async_trait]
pub trait SessionEngine: Send + Sync + 'static {
    async fn serve_session(
        &self,
        stream: BoxedStream,
        peer: SocketAddr,
    ) -> Result<SessionSummary, SessionError>;
}

/// A SOCKS5 engine requiring username/password authentication and
/// supporting the CONNECT command.
#[derive(Debug, Clone)]
pub struct Socks5Engine {
    credentials: StaticCredentials,
}

impl Socks5Engine {
    pub fn new(credentials: StaticCredentials) -> Self {
        Self { credentials }
    }

    async fn authenticate(&self, stream: &mut BoxedStream, peer: SocketAddr) -> Result<(), SessionError> {
        let methods = protocol::read_greeting(stream).await?;
        if !methods.contains(&(AuthMethod::UserPass as u8)) {
            protocol::write_method_selection(stream, AuthMethod::NoAcceptable).await?;
            return Err(SessionError::NoAcceptableMethod);
        }
        protocol::write_method_selection(stream, AuthMethod::UserPass).await?;

        let (login, password) = protocol::read_credentials(stream).await?;
        if !self.credentials.verify(&login, &password) {
            protocol::write_auth_status(stream, AUTH_FAILURE).await?;
            return Err(SessionError::AuthFailed(login));
        }
        protocol::write_auth_status(stream, AUTH_SUCCESS).await?;
        debug!("Client {} authenticated as '{}'", peer, login);
        Ok(())
    }
}

#[async_trait]
impl SessionEngine for Socks5Engine {
    async fn serve_session(
        &self,
        mut stream: BoxedStream,
        peer: SocketAddr,
    ) -> Result<SessionSummary, SessionError> {
        self.authenticate(&mut stream, peer).await?;

        let request = match protocol::read_request(&mut stream).await {
            Ok(request) => request,
            Err(e @ SessionError::UnsupportedAddressType(_)) => {
                protocol::write_reply(&mut stream, ReplyCode::AddressTypeNotSupported, None).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        match Command::try_from(request.command) {
            Ok(Command::Connect) => {}
            _ => {
                protocol::write_reply(&mut stream, ReplyCode::CommandNotSupported, None).await?;
                return Err(SessionError::UnsupportedCommand(request.command));
            }
        }

        let target = request.target.to_string();
        let mut upstream = match connect(&request.target).await {
            Ok(upstream) => upstream,
            Err(source) => {
                let code = ReplyCode::from_io_error(&source);
                protocol::write_reply(&mut stream, code, None).await?;
                return Err(SessionError::Connect { target, source });
            }
        };
        protocol::write_reply(&mut stream, ReplyCode::Succeeded, upstream.local_addr().ok()).await?;
        debug!("Client {} connected to {}", peer, target);

        let (bytes_sent, bytes_received) =
            tokio::io::copy_bidirectional(&mut stream, &mut upstream).await?;

        Ok(SessionSummary {
            target,
            bytes_sent,
            bytes_received,
        })
    }
}

async fn connect(target: &TargetAddr) -> io::Result<TcpStream> {
    let attempt = async {
        match target {
            TargetAddr::Ip(addr) => TcpStream::connect(addr).await,
            TargetAddr::Domain(host, port) => TcpStream::connect((host.as_str(), *port)).await,
        }
    };
    tokio::time::timeout(CONNECT_TIMEOUT, attempt)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
}
