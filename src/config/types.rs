//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_SCRIPT_BYTES, DEFAULT_PREFIX, DEFAULT_STORE_PATH,
    DEFAULT_USER_AGENT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use script_harvest::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     files: vec![PathBuf::from("crawl.warc.gz")],
///     prefix: PathBuf::from("./scripts"),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Web archive files to scan, in order
    pub files: Vec<PathBuf>,

    /// Directory under which extracted scripts are written
    pub prefix: PathBuf,

    /// Dedup store path (SQLite file shared by all runs)
    pub store_path: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Per-request timeout in seconds for external scripts
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value for external scripts
    pub user_agent: String,

    /// Maximum accepted size of an external script body in bytes
    pub max_script_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            prefix: PathBuf::from(DEFAULT_PREFIX),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_script_bytes: DEFAULT_MAX_SCRIPT_BYTES,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Extract scripts from two archives into ./scripts
/// script_harvest extract crawl-00.warc.gz crawl-01.warc.gz --prefix ./scripts
///
/// # Re-admit a script whose fingerprints were logged after a failure
/// script_harvest release --path-fingerprint 3f2a... --script-fingerprint 9b1c...
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "script_harvest",
    about = "Extracts inline and external JavaScript from web archives."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract scripts from one or more web archive files
    Extract(ExtractCommand),
    /// Remove fingerprints from the dedup store
    Release(ReleaseCommand),
}

/// Options of the `extract` subcommand.
#[derive(Debug, Args)]
pub struct ExtractCommand {
    /// WARC files to read (plain or gzip-compressed)
    #[arg(value_parser, required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Directory under which extracted scripts are written
    #[arg(long, value_parser, default_value = DEFAULT_PREFIX)]
    pub prefix: PathBuf,

    /// Dedup store path (SQLite file)
    #[arg(long, value_parser, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Per-request timeout in seconds for external scripts
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value for external scripts
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Maximum accepted size of an external script body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_SCRIPT_BYTES)]
    pub max_script_bytes: usize,
}

/// Options of the `release` subcommand.
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    /// Dedup store path (SQLite file)
    #[arg(long, value_parser, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Hex-encoded path fingerprint to remove
    #[arg(long)]
    pub path_fingerprint: Option<String>,

    /// Hex-encoded script fingerprint to remove
    #[arg(long)]
    pub script_fingerprint: Option<String>,
}

impl Config {
    /// Builds the library configuration from the `extract` options and the
    /// global logging options.
    pub fn from_extract(cmd: ExtractCommand, log_level: LogLevel, log_format: LogFormat) -> Self {
        Self {
            files: cmd.files,
            prefix: cmd.prefix,
            store_path: cmd.store,
            log_level,
            log_format,
            timeout_seconds: cmd.timeout_seconds,
            user_agent: cmd.user_agent,
            max_script_bytes: cmd.max_script_bytes,
        }
    }
}
