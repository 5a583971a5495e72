//! Script occurrences and the reservation tracked for rollback.

use std::fmt;

use crate::html::TagPosition;
use crate::storage::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceKind {
    Inline,
    External,
}

/// The script occurrence most recently acted on in a response.
///
/// Kept for diagnostics: when a scan fails, the driver logs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub kind: OccurrenceKind,
    /// The `src` URL for external scripts, the document URL for inline ones
    pub source_url: String,
    /// Start-tag position of an inline script
    pub anchor: Option<TagPosition>,
}

impl Occurrence {
    pub fn inline(source_url: &str, anchor: TagPosition) -> Self {
        Self {
            kind: OccurrenceKind::Inline,
            source_url: source_url.to_string(),
            anchor: Some(anchor),
        }
    }

    pub fn external(source_url: &str) -> Self {
        Self {
            kind: OccurrenceKind::External,
            source_url: source_url.to_string(),
            anchor: None,
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.anchor) {
            (OccurrenceKind::Inline, Some(anchor)) => {
                write!(f, "inline script at {anchor} of {}", self.source_url)
            }
            _ => write!(f, "external script {}", self.source_url),
        }
    }
}

/// Fingerprints reserved for the occurrence in progress.
///
/// Set when a path is reserved and cleared once the occurrence is settled
/// (written, discarded, a duplicate, or a failed retrieval). Whatever is still
/// set when a scan fails is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReservation {
    pub path: Fingerprint,
    pub script: Option<Fingerprint>,
}

impl PendingReservation {
    pub fn new(path: Fingerprint) -> Self {
        Self { path, script: None }
    }
}

impl fmt::Display for PendingReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path {}", self.path)?;
        if let Some(script) = &self.script {
            write!(f, ", script {script}")?;
        }
        Ok(())
    }
}
