// src/connection/mod.rs

//! Manages the lifecycle of a single accepted connection: registration,
//! the optional session deadline, delegation to the engine, and unregistration.

mod guard;
mod handler;

pub use guard::RegistrationGuard;
pub use handler::ConnectionHandler;
