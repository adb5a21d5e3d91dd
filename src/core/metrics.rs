// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the gateway.
//!
//! `lazy_static` makes sure each metric is registered exactly once in the
//! default registry for the whole process.

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, TextEncoder, register_counter, register_gauge};

lazy_static! {
    /// The number of connections currently registered as active.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("pupok_connected_clients", "Number of connections currently registered as active.")
            .expect("pupok_connected_clients can be registered");

    /// The total number of connections accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("pupok_connections_received_total", "Total number of connections accepted.")
            .expect("pupok_connections_received_total can be registered");
    /// The total number of sessions that ended with an error.
    pub static ref SESSION_FAILURES_TOTAL: Counter =
        register_counter!("pupok_session_failures_total", "Total number of sessions that ended with an error.")
            .expect("pupok_session_failures_total can be registered");
    pub static ref ACCEPT_ERRORS_TOTAL: Counter =
        register_counter!("pupok_accept_errors_total", "Total number of failed accept calls.")
            .expect("pupok_accept_errors_total can be registered");
    /// The total number of closed entries removed from the registry by the sweeper.
    pub static ref REGISTRY_RECLAIMED_TOTAL: Counter =
        register_counter!("pupok_registry_reclaimed_total", "Total number of closed registry entries reclaimed.")
            .expect("pupok_registry_reclaimed_total can be registered");
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
