//! The record driver: archives in, one scanner per response record.
//!
//! Nothing that goes wrong inside a record escapes it. A read error in the
//! middle of an archive ends that archive; only an archive that cannot be
//! opened at all is reported to the caller.

use std::path::Path;
use std::time::Instant;

use log::{debug, error, info, warn};
use url::Url;

use crate::app::log_progress;
use crate::archive::{open_archive, ArchiveRecord, DecodedResponse, RecordType};
use crate::config::LOGGING_INTERVAL;
use crate::error_handling::{ArchiveError, ErrorType, InfoType};
use crate::scan::{ExtractionContext, ScriptScanner};

/// Counters across all archives of a run.
#[derive(Debug)]
pub struct RunProgress {
    pub archives: usize,
    pub records: usize,
    pub start_time: Instant,
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            archives: 0,
            records: 0,
            start_time: Instant::now(),
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Processes every record of the archive at `path`.
///
/// # Errors
///
/// Returns `ArchiveError::Open` if the archive cannot be opened. Errors while
/// reading records are logged and end this archive without an error.
pub async fn process_archive(
    ctx: &ExtractionContext,
    path: &Path,
    progress: &mut RunProgress,
) -> Result<(), ArchiveError> {
    info!("Extracting JS files from {}...", path.display());
    let reader = open_archive(path)?;
    progress.archives += 1;

    let mut in_archive = 0usize;
    for record in reader {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                error!(
                    "Stopped reading {} after {} records: {e}",
                    path.display(),
                    in_archive
                );
                ctx.stats.increment_error(ErrorType::ArchiveReadError);
                break;
            }
        };
        in_archive += 1;
        progress.records += 1;
        process_record(ctx, &record).await;

        if progress.records % LOGGING_INTERVAL == 0 {
            log_progress(progress.start_time, progress.records);
        }
    }
    debug!("Finished {} ({} records)", path.display(), in_archive);
    Ok(())
}

/// Scans one archive record if it is a response.
///
/// A scan failure releases the pending reservation and is logged with the
/// last script occurrence of the response.
pub async fn process_record(ctx: &ExtractionContext, record: &ArchiveRecord) {
    if record.record_type != RecordType::Response {
        ctx.stats.increment_info(InfoType::NonResponseRecord);
        return;
    }

    let response = match DecodedResponse::from_record(record) {
        Ok(response) => response,
        Err(e) => {
            warn!("Cannot parse HTTP response of {}: {e}", record.url);
            ctx.stats.increment_error(ErrorType::HttpParseError);
            return;
        }
    };
    let url = match Url::parse(&response.url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Invalid record URL {:?}: {e}", response.url);
            ctx.stats.increment_error(ErrorType::InvalidRecordUrl);
            return;
        }
    };
    ctx.stats.increment_info(InfoType::ResponseScanned);

    let mut scanner = ScriptScanner::new(ctx, url, response.date);
    let Err(scan_error) = scanner.scan(&response.body).await else {
        return;
    };
    ctx.stats.increment_error(ErrorType::ScanError);

    let occurrence = scanner
        .last_occurrence()
        .map_or_else(|| "no script occurrence".to_string(), ToString::to_string);
    match scanner.rollback().await {
        Ok(Some(released)) => error!(
            "Scan of {} failed ({scan_error}); last: {occurrence}; released {released}",
            response.url
        ),
        Ok(None) => error!(
            "Scan of {} failed ({scan_error}); last: {occurrence}",
            response.url
        ),
        Err(rollback_error) => error!(
            "Scan of {} failed ({scan_error}); last: {occurrence}; rollback failed: {rollback_error}",
            response.url
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error_handling::{ExtractionStats, RetrievalError};
    use crate::fetch::ScriptFetcher;
    use crate::storage::{InMemoryDedupStore, Namespace};
    use crate::writer::ScriptWriter;

    struct NoFetch;

    #[async_trait]
    impl ScriptFetcher for NoFetch {
        async fn fetch(&self, _url: &Url) -> Result<Vec<u8>, RetrievalError> {
            Err(RetrievalError::Status(404))
        }
    }

    fn response(url: &str, payload: &[u8]) -> ArchiveRecord {
        ArchiveRecord {
            record_type: RecordType::Response,
            url: url.to_string(),
            content_length: payload.len() as u64,
            payload: payload.to_vec(),
        }
    }

    fn context(prefix: &Path, store: Arc<InMemoryDedupStore>) -> ExtractionContext {
        ExtractionContext::new(
            store,
            Arc::new(NoFetch),
            Arc::new(ScriptWriter::new(prefix)),
            Arc::new(ExtractionStats::new()),
        )
    }

    #[tokio::test]
    async fn test_non_response_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone());
        let mut record = response("http://example.com/", b"GET / HTTP/1.1\r\n\r\n");
        record.record_type = RecordType::Other("request".to_string());

        process_record(&ctx, &record).await;

        assert_eq!(ctx.stats.get_info_count(InfoType::NonResponseRecord), 1);
        assert_eq!(ctx.stats.get_info_count(InfoType::ResponseScanned), 0);
    }

    #[tokio::test]
    async fn test_unparsable_response_and_url_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::new(InMemoryDedupStore::new()));

        process_record(&ctx, &response("http://example.com/", b"garbage")).await;
        process_record(&ctx, &response("not a url", b"HTTP/1.1 200 OK\r\n\r\n")).await;

        assert_eq!(ctx.stats.get_error_count(ErrorType::HttpParseError), 1);
        assert_eq!(ctx.stats.get_error_count(ErrorType::InvalidRecordUrl), 1);
    }

    #[tokio::test]
    async fn test_scan_failure_is_contained_in_its_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone());

        process_record(
            &ctx,
            &response(
                "http://example.com/bad",
                b"HTTP/1.1 200 OK\r\n\r\n<script>a()</script><![bogus[ x ]]>",
            ),
        )
        .await;
        process_record(
            &ctx,
            &response("http://example.com/good", b"HTTP/1.1 200 OK\r\n\r\n<script>b()</script>"),
        )
        .await;

        assert_eq!(ctx.stats.get_error_count(ErrorType::ScanError), 1);
        assert_eq!(ctx.stats.get_info_count(InfoType::ScriptWritten), 2);
        assert_eq!(store.len(Namespace::Scripts), 2);
    }

    #[tokio::test]
    async fn test_missing_archive_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::new(InMemoryDedupStore::new()));
        let mut progress = RunProgress::new();

        let result = process_archive(&ctx, &dir.path().join("missing.warc"), &mut progress).await;

        assert!(matches!(result, Err(ArchiveError::Open { .. })));
        assert_eq!(progress.archives, 0);
    }

    #[tokio::test]
    async fn test_corrupt_archive_tail_ends_archive_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.warc");
        let payload = b"HTTP/1.1 200 OK\r\n\r\n<script>c()</script>";
        let mut data = format!(
            "WARC/1.0\r\nWARC-Type: response\r\nWARC-Target-URI: http://example.com/\r\nContent-Length: {}\r\n\r\n",
            payload.len()
        )
        .into_bytes();
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\r\n\r\nthis is not a record\r\n");
        std::fs::write(&path, data).unwrap();

        let ctx = context(dir.path(), Arc::new(InMemoryDedupStore::new()));
        let mut progress = RunProgress::new();
        process_archive(&ctx, &path, &mut progress).await.unwrap();

        assert_eq!(progress.archives, 1);
        assert_eq!(progress.records, 1);
        assert_eq!(ctx.stats.get_error_count(ErrorType::ArchiveReadError), 1);
        assert_eq!(ctx.stats.get_info_count(InfoType::ScriptWritten), 1);
    }
}
