//! Error handling and extraction statistics.
//!
//! This module provides:
//! - Error type definitions per concern (store, archive, HTTP, scan, retrieval)
//! - Extraction statistics tracking (record-level failures, info metrics)
//!
//! Nothing in here aborts a run: record-level failures are counted and logged,
//! and the pipeline moves on to the next record.

mod stats;
mod types;

// Re-export public API
pub use stats::ExtractionStats;
pub use types::{
    ArchiveError, ErrorType, HttpParseError, InfoType, InitializationError, RetrievalError,
    ScanError, StoreError,
};
