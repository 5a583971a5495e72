//! Run finalization.
//!
//! This module contains the `finalize_extraction` function which closes the
//! store, prints statistics and builds the report.

use log::info;

use crate::app::{log_progress, print_extraction_statistics, print_simple_summary};
use crate::error_handling::{ErrorType, ExtractionStats, InfoType};

use super::driver::RunProgress;
use super::init::ExtractionResources;
use super::ExtractionReport;

/// Builds the report from the run's counters.
pub fn build_report(stats: &ExtractionStats, progress: &RunProgress) -> ExtractionReport {
    ExtractionReport {
        archives: progress.archives,
        records: progress.records,
        responses: stats.get_info_count(InfoType::ResponseScanned),
        scripts_written: stats.get_info_count(InfoType::ScriptWritten),
        scripts_quarantined: stats.get_info_count(InfoType::ScriptQuarantined),
        markup_discarded: stats.get_info_count(InfoType::MarkupDiscarded),
        retrieval_failures: stats.get_error_count(ErrorType::RetrievalError),
        scan_failures: stats.get_error_count(ErrorType::ScanError),
        elapsed_seconds: progress.start_time.elapsed().as_secs_f64(),
    }
}

/// Finalize an extraction run and produce the report.
///
/// 1. Log final progress
/// 2. Close the dedup store pool (checkpointing the WAL)
/// 3. Print statistics and a one-line summary
pub async fn finalize_extraction(
    resources: ExtractionResources,
    progress: RunProgress,
) -> ExtractionReport {
    log_progress(progress.start_time, progress.records);

    resources.store.pool().close().await;
    info!("Dedup store closed");

    let report = build_report(&resources.ctx.stats, &progress);
    print_extraction_statistics(&resources.ctx.stats);
    print_simple_summary(
        report.archives,
        report.responses,
        report.scripts_written,
        report.elapsed_seconds,
    );
    report
}
