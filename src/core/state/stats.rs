// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds all counters related to connection and session outcomes.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of sessions that ended with an error.
    failed_sessions: AtomicU64,
    /// The number of failed sessions that were cut off by their deadline.
    expired_sessions: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    /// Creates a new `StatsState` with zeroed counters.
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            failed_sessions: AtomicU64::new(0),
            expired_sessions: AtomicU64::new(0),
        }
    }

    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_failed_sessions(&self) {
        self.failed_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_failed_sessions(&self) -> u64 {
        self.failed_sessions.load(Ordering::Relaxed)
    }

    pub fn increment_expired_sessions(&self) {
        self.expired_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_expired_sessions(&self) -> u64 {
        self.expired_sessions.load(Ordering::Relaxed)
    }
}
