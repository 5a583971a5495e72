//! Extraction context shared by every scanned response.
//!
//! This module defines the `ExtractionContext` struct that groups the
//! collaborators a scanner needs, so a fresh scanner per response is cheap
//! to build and the collaborators can be swapped for fakes in tests.

use std::sync::Arc;

use crate::error_handling::ExtractionStats;
use crate::fetch::ScriptFetcher;
use crate::storage::DedupStore;
use crate::writer::ScriptWriter;

/// Context containing all shared resources needed for script extraction.
#[derive(Clone)]
pub struct ExtractionContext {
    /// Path and script fingerprint sets shared with every other run
    pub store: Arc<dyn DedupStore>,
    /// Retrieval of externally referenced scripts
    pub fetcher: Arc<dyn ScriptFetcher>,
    /// Classification and output of script bodies
    pub writer: Arc<ScriptWriter>,
    /// Counters for the run report
    pub stats: Arc<ExtractionStats>,
}

impl ExtractionContext {
    pub fn new(
        store: Arc<dyn DedupStore>,
        fetcher: Arc<dyn ScriptFetcher>,
        writer: Arc<ScriptWriter>,
        stats: Arc<ExtractionStats>,
    ) -> Self {
        Self {
            store,
            fetcher,
            writer,
            stats,
        }
    }
}
