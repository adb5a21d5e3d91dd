// src/core/socks/mod.rs

//! The SOCKS5 protocol engine the lifecycle handler delegates each session to.

mod credentials;
mod engine;
pub mod protocol;

pub use credentials::StaticCredentials;
pub use engine::{SessionEngine, SessionSummary, Socks5Engine};
