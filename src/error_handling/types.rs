//! Error type definitions.
//!
//! This module defines all error and info types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for dedup store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error creating the store's parent directory.
    #[error("Store directory creation error: {0}")]
    DirectoryCreationError(#[from] std::io::Error),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// A fingerprint given on the command line is not 20 hex-encoded bytes.
    #[error("Invalid fingerprint {0:?}: expected 40 hex digits")]
    InvalidFingerprint(String),
}

/// Errors reading a web archive.
///
/// Only [`ArchiveError::Open`] aborts a run; the others end the current archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("Cannot open archive {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the (possibly compressed) archive stream failed.
    #[error("Archive read error: {0}")]
    Io(#[from] std::io::Error),

    /// A record did not start with a `WARC/` version line.
    #[error("Malformed WARC version line {0:?}")]
    BadVersionLine(String),

    /// A record header line had no `:` separator.
    #[error("Malformed WARC header line {0:?}")]
    BadHeaderLine(String),

    /// A record had no usable `Content-Length` header.
    #[error("WARC record without a valid Content-Length")]
    MissingContentLength,

    /// The stream ended inside a record's content block.
    #[error("WARC record truncated: expected {expected} bytes, read {actual}")]
    Truncated { expected: u64, actual: u64 },
}

/// Errors splitting an archived HTTP response into headers and body.
#[derive(Error, Debug)]
pub enum HttpParseError {
    /// The status line or header block is incomplete.
    #[error("Incomplete HTTP response header")]
    Incomplete,

    /// The status line or header block is malformed.
    #[error("Malformed HTTP response: {0}")]
    Malformed(#[from] httparse::Error),

    /// The chunked transfer coding is malformed.
    #[error("Malformed chunked body: {0}")]
    Chunked(String),

    /// The content coding could not be decoded.
    #[error("Cannot decode {encoding} body: {source}")]
    Decode {
        encoding: String,
        #[source]
        source: std::io::Error,
    },
}

/// Unrecoverable conditions while scanning one response's markup.
///
/// Any of these aborts the scan of the current response; the record driver
/// rolls back the pending reservation and continues with the next record.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A `<` appeared inside a start tag's attribute list, outside any quoted value.
    #[error("Malformed start tag at line {line}, column {column}")]
    MalformedStartTag { line: usize, column: usize },

    /// A `<![keyword[` marked section used an unknown keyword.
    #[error("Unknown status keyword {keyword:?} in marked section at line {line}, column {column}")]
    UnknownMarkedSection {
        keyword: String,
        line: usize,
        column: usize,
    },

    /// The dedup store failed while reserving a fingerprint.
    #[error("Dedup store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures retrieving an externally referenced script.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The server answered with a status other than 200.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request failed before a response body was read.
    #[error("Transport error: {0}")]
    Transport(#[from] ReqwestError),

    /// The body exceeded the configured maximum script size.
    #[error("Body too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

/// Types of record-level failures that can occur during extraction.
///
/// None of these abort a run; each is counted and the pipeline moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    HttpParseError,
    InvalidRecordUrl,
    InvalidScriptUrl,
    RetrievalError,
    ScanError,
    WriteError,
    ArchiveReadError,
}

/// Types of informational metrics that can occur during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    ResponseScanned,
    NonResponseRecord,
    ScriptWritten,
    ScriptQuarantined,
    MarkupDiscarded,
    DuplicatePath,
    DuplicateScript,
    UnsupportedScheme,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpParseError => "HTTP parse error",
            ErrorType::InvalidRecordUrl => "Invalid record URL",
            ErrorType::InvalidScriptUrl => "Invalid script URL",
            ErrorType::RetrievalError => "Script retrieval error",
            ErrorType::ScanError => "Markup scan error",
            ErrorType::WriteError => "Script write error",
            ErrorType::ArchiveReadError => "Archive read error",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::ResponseScanned => "Responses scanned",
            InfoType::NonResponseRecord => "Non-response records skipped",
            InfoType::ScriptWritten => "Scripts written",
            InfoType::ScriptQuarantined => "Scripts quarantined",
            InfoType::MarkupDiscarded => "Markup bodies discarded",
            InfoType::DuplicatePath => "Duplicate paths skipped",
            InfoType::DuplicateScript => "Duplicate scripts skipped",
            InfoType::UnsupportedScheme => "Unsupported script URL schemes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for error_type in ErrorType::iter() {
            assert!(!error_type.as_str().is_empty());
            assert!(seen.insert(error_type.as_str()));
        }
    }

    #[test]
    fn test_info_type_as_str_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for info_type in InfoType::iter() {
            assert!(seen.insert(info_type.as_str()));
        }
    }

    #[test]
    fn test_error_type_display_matches_as_str() {
        assert_eq!(ErrorType::ScanError.to_string(), "Markup scan error");
    }

    #[test]
    fn test_scan_error_messages_carry_position() {
        let err = ScanError::UnknownMarkedSection {
            keyword: "bogus".to_string(),
            line: 3,
            column: 7,
        };
        let message = err.to_string();
        assert!(message.contains("\"bogus\""));
        assert!(message.contains("line 3, column 7"));
    }

    #[test]
    fn test_store_error_converts_into_scan_error() {
        let err: ScanError = StoreError::InvalidFingerprint("zz".to_string()).into();
        assert!(matches!(err, ScanError::Store(_)));
    }
}
