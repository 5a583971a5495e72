//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (bounds, timeouts, limits)
//! - WARC and HTTP header name constants
//! - CLI option types and the library `Config`

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{Command, Config, ExtractCommand, LogFormat, LogLevel, Opt, ReleaseCommand};
