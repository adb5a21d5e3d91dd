// src/connection/guard.rs

//! Defines `RegistrationGuard`, an RAII guard tying a registry entry to a connection's lifetime.

use crate::core::metrics;
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;
use tracing::debug;

/// Marks an address active on creation and closed when dropped.
///
/// Because unregistration lives in `Drop`, it runs exactly once no matter how
/// the session ends: normal return, error, deadline expiry, task abort or panic.
pub struct RegistrationGuard {
    registry: Arc<ConnectionRegistry>,
    addr: String,
}

impl RegistrationGuard {
    /// Registers `addr` as active and returns the guard that will close it.
    pub fn register(registry: Arc<ConnectionRegistry>, addr: String) -> Self {
        registry.set_active(&addr, true);
        metrics::CONNECTED_CLIENTS.inc();
        Self { registry, addr }
    }

    /// The registry key this guard owns.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.set_active(&self.addr, false);
        metrics::CONNECTED_CLIENTS.dec();
        debug!("Connection {} marked closed in the registry.", self.addr);
    }
}
