//! script_harvest library: JavaScript extraction from web archives
//!
//! This library scans the HTML responses captured in WARC files for inline
//! and externally referenced `<script>`s and writes every distinct script once
//! to a sharded, content-addressed tree, with a provenance header naming the
//! retrieval date and source URL.
//!
//! Deduplication is shared by every run that points at the same store: a
//! derived path or a script body that any earlier run reserved is never
//! fetched or written again.
//!
//! # Example
//!
//! ```no_run
//! use script_harvest::{run_extraction, Config};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     files: vec![PathBuf::from("crawl-00.warc.gz")],
//!     prefix: PathBuf::from("scripts"),
//!     ..Default::default()
//! };
//!
//! let report = run_extraction(config).await?;
//! println!("{} scripts written, {} quarantined",
//!          report.scripts_written, report.scripts_quarantined);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod archive;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod html;
pub mod initialization;
pub mod javascript;
pub mod mime;
pub mod path_scheme;
mod run;
pub mod scan;
pub mod storage;
pub mod utils;
pub mod writer;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use fetch::{HttpFetcher, ScriptFetcher};
pub use path_scheme::derive_path;
pub use run::{
    extract_archives, process_archive, process_record, release_fingerprints, run_extraction,
    ExtractionReport, RunProgress,
};
pub use scan::{ExtractionContext, ScriptScanner};
pub use storage::{DedupStore, InMemoryDedupStore, SqliteDedupStore};
pub use writer::{ScriptWriter, WriteOutcome};
