//! Configuration constants.
//!
//! This module defines the constants used throughout the application, including
//! path-scheme bounds, size limits, timeouts and output layout names.

// Path scheme bounds
/// Maximum length of the percent-escaped host segment of a derived path.
///
/// Together with [`MAX_FILENAME_LENGTH`] and the two shard segments this keeps a
/// derived path under 192 bytes, leaving 63 bytes for the output prefix when the
/// full path is restricted to 255 bytes.
pub const MAX_HOST_SEGMENT_LENGTH: usize = 89;
/// Maximum length of the file name of a derived path (right-truncated)
pub const MAX_FILENAME_LENGTH: usize = 92;
/// Minimum length of the normalized host used for sharding; shorter hosts are padded
pub const MIN_SHARD_SOURCE_LENGTH: usize = 2;
/// Character used to pad short normalized hosts
pub const SHARD_PAD_CHAR: char = '_';
/// Extension every extracted script file carries
pub const SCRIPT_EXTENSION: &str = ".js";

// Output layout
/// Path segment prepended to scripts that fail syntax validation
pub const QUARANTINE_DIR: &str = ".bad";
/// Default output prefix directory
pub const DEFAULT_PREFIX: &str = ".";
/// Default dedup store location (SQLite file)
pub const DEFAULT_STORE_PATH: &str = "./script_fingerprints.db";

// Retrieval
/// Per-request timeout in seconds for external script retrieval
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
/// Maximum external script body size in bytes (10MB)
/// Larger bodies are treated as retrieval failures
pub const DEFAULT_MAX_SCRIPT_BYTES: usize = 10 * 1024 * 1024;
/// Format of retrieval dates generated for externally fetched scripts (RFC 1123, UTC)
pub const RETRIEVAL_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Default User-Agent string for external script requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Syntax checking
/// Maximum wall-clock time in milliseconds QuickJS may spend checking one script
/// Prevents pathological inputs from stalling the pipeline
pub const MAX_JS_CHECK_TIME_MS: u64 = 2000;
/// Maximum memory limit for the QuickJS runtime used for syntax checks (64MB)
/// Parsing large minified bundles needs considerably more than the source size
pub const MAX_JS_MEMORY_LIMIT: usize = 64 * 1024 * 1024;

// Dedup store
/// How long a store connection waits on a lock held by another process
pub const STORE_BUSY_TIMEOUT_SECS: u64 = 5;

// Progress logging
/// Log progress every this many archive records
pub const LOGGING_INTERVAL: usize = 1000;
