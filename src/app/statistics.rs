//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ExtractionStats, InfoType};

/// Prints error and info counters to the log, skipping zero counts.
pub fn print_extraction_statistics(stats: &ExtractionStats) {
    let total_errors = stats.total_errors();
    let total_info = stats.total_info();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

/// Prints a one-line summary of the run.
pub fn print_simple_summary(archives: usize, responses: usize, written: usize, elapsed_seconds: f64) {
    info!(
        "Scanned {} response{} from {} archive{} and wrote {} script{} in {:.1}s",
        responses,
        if responses == 1 { "" } else { "s" },
        archives,
        if archives == 1 { "" } else { "s" },
        written,
        if written == 1 { "" } else { "s" },
        elapsed_seconds
    );
}
