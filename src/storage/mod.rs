//! Dedup store: two persistent sets of SHA-1 fingerprints.
//!
//! This module provides:
//! - The [`Fingerprint`] type and the two [`Namespace`]s (paths, scripts)
//! - The [`DedupStore`] trait with atomic reserve and compensating release
//! - A SQLite-backed store shared by concurrent and successive runs
//! - An in-memory store for tests

pub mod dedup;
pub mod fingerprint;
pub mod memory;
pub mod migrations;
pub mod pool;

#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use dedup::{DedupStore, SqliteDedupStore};
pub use fingerprint::{Fingerprint, Namespace};
pub use memory::InMemoryDedupStore;
pub use migrations::run_migrations;
pub use pool::init_store_pool;
