//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `script_harvest` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use script_harvest::config::{Command, LogFormat, Opt};
use script_harvest::initialization::init_logger_with;
use script_harvest::{release_fingerprints, run_extraction, Config, ExtractionReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), so RUST_LOG
    // can be kept next to the archives
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let log_format = opt.log_format.clone();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let result = match opt.command {
        Command::Extract(cmd) => {
            let config = Config::from_extract(cmd, opt.log_level, opt.log_format);
            run_extraction(config)
                .await
                .map(|report| print_report(&report, &log_format))
        }
        Command::Release(cmd) => {
            release_fingerprints(
                &cmd.store,
                cmd.path_fingerprint.as_deref(),
                cmd.script_fingerprint.as_deref(),
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("script_harvest error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

/// Prints the run summary to stdout.
fn print_report(report: &ExtractionReport, format: &LogFormat) {
    match format {
        LogFormat::Json => match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Cannot serialize report: {e}"),
        },
        LogFormat::Plain => {
            println!(
                "Scanned {} response{} in {} archive{} ({} records) in {:.1}s",
                report.responses,
                if report.responses == 1 { "" } else { "s" },
                report.archives,
                if report.archives == 1 { "" } else { "s" },
                report.records,
                report.elapsed_seconds
            );
            println!(
                "Scripts: {} written, {} quarantined, {} discarded as markup",
                report.scripts_written, report.scripts_quarantined, report.markup_discarded
            );
            println!(
                "Failures: {} retrievals, {} scans",
                report.retrieval_failures, report.scan_failures
            );
        }
    }
}
