// Shared test helpers for archive fixtures and fake collaborators.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use script_harvest::error_handling::{ExtractionStats, RetrievalError};
use script_harvest::{DedupStore, ExtractionContext, ScriptFetcher, ScriptWriter};

/// Builds one WARC record with the given type, target URI and payload.
pub fn warc_record(warc_type: &str, uri: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "WARC/1.0\r\nWARC-Type: {warc_type}\r\nWARC-Target-URI: {uri}\r\nContent-Length: {}\r\n\r\n",
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n\r\n");
    out
}

/// Builds an archived `200 OK` HTML response with optional extra headers.
pub fn html_response(extra_headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    let mut out = String::from("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n");
    for (name, value) in extra_headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
    out.push_str(body);
    out.into_bytes()
}

/// Writes the concatenated records to `dir/name` and returns the path.
pub fn write_archive(dir: &Path, name: &str, records: &[Vec<u8>]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create archive fixture");
    for record in records {
        file.write_all(record).expect("Failed to write archive fixture");
    }
    path
}

/// Fetcher answering from a fixed URL-to-body map; anything else is a 404.
#[allow(dead_code)] // Used by other test files
#[derive(Default)]
pub struct MapFetcher(pub HashMap<String, Vec<u8>>);

impl MapFetcher {
    #[allow(dead_code)] // Used by other test files
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.0.insert(url.to_string(), body.to_vec());
        self
    }
}

#[async_trait]
impl ScriptFetcher for MapFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RetrievalError> {
        self.0
            .get(url.as_str())
            .cloned()
            .ok_or(RetrievalError::Status(404))
    }
}

/// Context writing under `prefix` with the default oracles.
#[allow(dead_code)] // Used by other test files
pub fn context(
    prefix: &Path,
    store: Arc<dyn DedupStore>,
    fetcher: Arc<dyn ScriptFetcher>,
) -> ExtractionContext {
    ExtractionContext::new(
        store,
        fetcher,
        Arc::new(ScriptWriter::new(prefix)),
        Arc::new(ExtractionStats::new()),
    )
}

/// Reads a written script as text.
#[allow(dead_code)] // Used by other test files
pub fn read_script(prefix: &Path, relative: &str) -> String {
    std::fs::read_to_string(prefix.join(relative))
        .unwrap_or_else(|e| panic!("Expected {relative} to be written: {e}"))
}

/// Counts regular files under `dir`, recursively.
#[allow(dead_code)] // Used by other test files
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
