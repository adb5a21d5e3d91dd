// src/core/errors.rs

//! Defines the error type for a single proxied session.

use std::io;
use thiserror::Error;

/// Every way a SOCKS5 session can end unsuccessfully.
///
/// These never escape the connection task; they are logged and counted there.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported SOCKS version {0}")]
    UnsupportedVersion(u8),

    #[error("Client offered no acceptable authentication method")]
    NoAcceptableMethod,

    #[error("Authentication failed for user '{0}'")]
    AuthFailed(String),

    #[error("Unsupported command {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("Unsupported address type {0:#04x}")]
    UnsupportedAddressType(u8),

    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Session deadline exceeded")]
    DeadlineExceeded,
}

impl SessionError {
    /// Returns true for errors caused by the peer simply going away.
    pub fn is_normal_disconnect(&self) -> bool {
        match self {
            SessionError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
