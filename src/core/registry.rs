// src/core/registry.rs

//! The connection registry: a process-wide map from peer address to liveness state.
//!
//! Every mutation takes the write lock, while snapshots share the read lock, so
//! `set_active`, `reclaim` and `snapshot` are each atomic with respect to one another.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// The liveness state recorded for a peer address.
///
/// An address missing from the registry has either never been seen or has
/// already been reclaimed by the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The connection is registered and its session has not finished yet.
    Active,
    /// The session has finished; the entry waits for the next sweep.
    Closed,
}

/// A concurrency-safe store of `address -> ConnectionState`.
///
/// Keys are peer address strings (`host:port`). A later registration from the
/// same address overwrites the earlier state (last write wins).
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<String, ConnectionState>>,
    /// Every `set_active(_, false)` call since creation.
    closed_total: AtomicU64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the liveness state for `addr`.
    pub fn set_active(&self, addr: &str, active: bool) {
        debug_assert!(!addr.is_empty(), "registry keys must be non-empty");
        let state = if active {
            ConnectionState::Active
        } else {
            ConnectionState::Closed
        };
        self.entries.write().insert(addr.to_owned(), state);
        if !active {
            self.closed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns every address currently flagged active. Order is unspecified.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|(_, state)| **state == ConnectionState::Active)
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    /// Removes every entry flagged closed and returns how many were removed.
    /// Active entries are never touched.
    pub fn reclaim(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, state| *state == ConnectionState::Active);
        before - entries.len()
    }

    /// Returns the recorded state for `addr`, or `None` if it is not present.
    pub fn state_of(&self, addr: &str) -> Option<ConnectionState> {
        self.entries.read().get(addr).copied()
    }

    /// The number of entries, active and closed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// How many times an address has been marked closed. Reclaiming does not
    /// lower it.
    pub fn closed_total(&self) -> u64 {
        self.closed_total.load(Ordering::Relaxed)
    }

    /// The number of entries currently flagged active.
    pub fn active_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|state| **state == ConnectionState::Active)
            .count()
    }
}
