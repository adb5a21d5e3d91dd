// src/core/mod.rs

//! The connection lifecycle core: the registry, its sweeper, the protocol
//! engine seam, and shared server state.

pub mod errors;
pub mod metrics;
pub mod registry;
pub mod socks;
pub mod state;
pub mod tasks;

pub use errors::SessionError;
pub use registry::{ConnectionRegistry, ConnectionState};
