//! Extraction runs.
//!
//! This module provides [`run_extraction`], the library entry point, and
//! [`extract_archives`] for callers that bring their own collaborators.

mod driver;
mod finalize;
mod init;
mod release;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::scan::ExtractionContext;

pub use driver::{process_archive, process_record, RunProgress};
pub use finalize::build_report;
use init::init_extraction_resources;
pub use release::release_fingerprints;

/// Results of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    /// Archives opened
    pub archives: usize,
    /// Records read across all archives
    pub records: usize,
    /// Response records scanned
    pub responses: usize,
    /// Scripts written to their normal location
    pub scripts_written: usize,
    /// Unparsable scripts written under the quarantine tree
    pub scripts_quarantined: usize,
    /// Unparsable bodies dropped as mis-captured markup
    pub markup_discarded: usize,
    /// External scripts that could not be retrieved
    pub retrieval_failures: usize,
    /// Responses whose scan was aborted
    pub scan_failures: usize,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

/// Runs an extraction with the provided configuration.
///
/// Archives are processed in order, one record at a time. Per-record failures
/// are logged and counted; the run stops early only when an archive cannot be
/// opened.
///
/// # Errors
///
/// Returns an error if the dedup store or HTTP client cannot be initialized,
/// or an archive cannot be opened.
///
/// # Example
///
/// ```no_run
/// use script_harvest::{run_extraction, Config};
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     files: vec![PathBuf::from("crawl.warc.gz")],
///     prefix: PathBuf::from("scripts"),
///     ..Default::default()
/// };
/// let report = run_extraction(config).await?;
/// println!("Wrote {} scripts", report.scripts_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_extraction(config: Config) -> Result<ExtractionReport> {
    let resources = init_extraction_resources(&config).await?;
    let mut progress = RunProgress::new();

    let outcome = run_archives(&resources.ctx, &config.files, &mut progress).await;
    let report = finalize::finalize_extraction(resources, progress).await;
    outcome.map(|()| report)
}

/// Extracts scripts from `files` with caller-supplied collaborators.
///
/// # Errors
///
/// Returns an error if an archive cannot be opened.
pub async fn extract_archives(ctx: &ExtractionContext, files: &[PathBuf]) -> Result<ExtractionReport> {
    let mut progress = RunProgress::new();
    run_archives(ctx, files, &mut progress).await?;
    Ok(build_report(&ctx.stats, &progress))
}

async fn run_archives(ctx: &ExtractionContext, files: &[PathBuf], progress: &mut RunProgress) -> Result<()> {
    for file in files {
        process_archive(ctx, file, progress)
            .await
            .with_context(|| format!("Aborting run at {}", file.display()))?;
    }
    Ok(())
}
