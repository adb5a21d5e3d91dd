// src/server/stream.rs

use tokio::io::{AsyncRead, AsyncWrite};

/// Any bidirectional byte stream a session can run over (TCP in production,
/// in-memory pipes in tests).
pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// An owned, type-erased client stream handed from the listener to the engine.
pub type BoxedStream = Box<dyn ClientStream>;
