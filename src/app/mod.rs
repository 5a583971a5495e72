//! Run reporting helpers.
//!
//! This module provides progress logging and statistics printing used by the
//! extraction run.

pub mod logging;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use statistics::{print_extraction_statistics, print_simple_summary};
