// src/core/tasks/mod.rs

//! Long-running background tasks that keep shared state tidy.

pub mod registry_sweeper;
