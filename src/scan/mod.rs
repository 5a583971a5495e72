//! Script discovery in archived HTML responses.
//!
//! This module provides:
//! - [`ScriptScanner`]: the per-response state machine that reserves, retrieves
//!   and writes each script occurrence
//! - [`ExtractionContext`]: the collaborators every scanner shares
//! - [`Occurrence`] and [`PendingReservation`] for diagnostics and rollback

mod context;
mod occurrence;
mod scanner;

pub use context::ExtractionContext;
pub use occurrence::{Occurrence, OccurrenceKind, PendingReservation};
pub use scanner::ScriptScanner;
