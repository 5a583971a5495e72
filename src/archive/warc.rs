//! WARC record reader.
//!
//! Reads WARC/1.0 and WARC/1.1 records from a plain or gzip-compressed
//! stream. Compression is detected from the gzip magic bytes, so both
//! record-at-a-time `.warc.gz` files (one gzip member per record) and
//! whole-file compression work.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use super::{ArchiveRecord, RecordType};
use crate::config::{WARC_CONTENT_LENGTH, WARC_TARGET_URI, WARC_TYPE};
use crate::error_handling::ArchiveError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const VERSION_PREFIX: &str = "WARC/";

/// Iterator over the records of one archive.
///
/// The first error ends the iteration.
pub struct WarcReader<R> {
    reader: R,
    done: bool,
}

/// Opens `path` as a WARC file, decompressing gzip transparently.
///
/// # Errors
///
/// Returns `ArchiveError::Open` if the file cannot be opened or read.
pub fn open_archive(path: &Path) -> Result<WarcReader<Box<dyn BufRead + Send>>, ArchiveError> {
    let open_error = |source| ArchiveError::Open {
        path: path.display().to_string(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let mut reader = BufReader::new(file);
    let is_gzip = reader.fill_buf().map_err(open_error)?.starts_with(&GZIP_MAGIC);

    let reader: Box<dyn BufRead + Send> = if is_gzip {
        Box::new(BufReader::new(MultiGzDecoder::new(reader)))
    } else {
        Box::new(reader)
    };
    Ok(WarcReader::new(reader))
}

/// Reads one line including its terminator; empty at end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> Result<String, ArchiveError> {
    let mut buf = Vec::new();
    reader.read_until(b'\n', &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<ArchiveRecord>, ArchiveError> {
        // Records are separated by blank lines
        let version = loop {
            let line = read_line(&mut self.reader)?;
            if line.is_empty() {
                return Ok(None);
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                break trimmed.to_string();
            }
        };
        if !version.starts_with(VERSION_PREFIX) {
            return Err(ArchiveError::BadVersionLine(version));
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        loop {
            let line = read_line(&mut self.reader)?;
            if line.is_empty() {
                return Err(ArchiveError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream ended inside a WARC header block",
                )));
            }
            let content = line.trim_end_matches(['\r', '\n']);
            if content.is_empty() {
                break;
            }
            if content.starts_with([' ', '\t']) {
                // Folded continuation of the previous header
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(content.trim());
                    continue;
                }
            }
            let (name, value) = content
                .split_once(':')
                .ok_or_else(|| ArchiveError::BadHeaderLine(content.to_string()))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let header = |name: &str| {
            headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };
        let content_length: u64 = header(WARC_CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
            .ok_or(ArchiveError::MissingContentLength)?;
        let record_type = RecordType::from_header(header(WARC_TYPE).unwrap_or_default());
        let url = header(WARC_TARGET_URI)
            .map(|v| v.trim_start_matches('<').trim_end_matches('>').to_string())
            .unwrap_or_default();

        let mut payload = Vec::new();
        (&mut self.reader)
            .take(content_length)
            .read_to_end(&mut payload)?;
        if (payload.len() as u64) < content_length {
            return Err(ArchiveError::Truncated {
                expected: content_length,
                actual: payload.len() as u64,
            });
        }

        Ok(Some(ArchiveRecord {
            record_type,
            url,
            content_length,
            payload,
        }))
    }
}

impl<R: BufRead> Iterator for WarcReader<R> {
    type Item = Result<ArchiveRecord, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    fn record(warc_type: &str, uri: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "WARC/1.0\r\nWARC-Type: {warc_type}\r\nWARC-Target-URI: {uri}\r\nContent-Length: {}\r\n\r\n",
            payload.len()
        )
        .into_bytes();
        out.extend_from_slice(payload);
        out.extend_from_slice(b"\r\n\r\n");
        out
    }

    fn read_all(data: Vec<u8>) -> Vec<Result<ArchiveRecord, ArchiveError>> {
        WarcReader::new(Cursor::new(data)).collect()
    }

    #[test]
    fn test_reads_records_in_order() {
        let mut data = record("request", "http://example.com/", b"GET / HTTP/1.1\r\n\r\n");
        data.extend(record("response", "http://example.com/", b"HTTP/1.1 200 OK\r\n\r\nhi"));

        let records: Vec<ArchiveRecord> = read_all(data).into_iter().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, RecordType::Other("request".to_string()));
        assert_eq!(records[1].record_type, RecordType::Response);
        assert_eq!(records[1].url, "http://example.com/");
        assert_eq!(records[1].payload, b"HTTP/1.1 200 OK\r\n\r\nhi");
        assert_eq!(records[1].content_length, 21);
    }

    #[test]
    fn test_angle_bracketed_target_uri() {
        let data = record("response", "<http://example.com/x>", b"");
        let records = read_all(data);
        assert_eq!(records[0].as_ref().unwrap().url, "http://example.com/x");
    }

    #[test]
    fn test_truncated_payload_is_an_error_and_ends_iteration() {
        let mut data = record("response", "http://example.com/", b"0123456789");
        data.truncate(data.len() - 8);
        let records = read_all(data);
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0],
            Err(ArchiveError::Truncated { expected: 10, actual: 6 })
        ));
    }

    #[test]
    fn test_missing_content_length() {
        let data = b"WARC/1.0\r\nWARC-Type: response\r\n\r\n".to_vec();
        assert!(matches!(read_all(data)[0], Err(ArchiveError::MissingContentLength)));
    }

    #[test]
    fn test_garbage_is_a_bad_version_line() {
        let records = read_all(b"not a warc file\n".to_vec());
        assert!(matches!(records[0], Err(ArchiveError::BadVersionLine(_))));
    }

    #[test]
    fn test_open_archive_detects_gzip_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.warc.gz");

        // One gzip member per record
        let mut file = std::fs::File::create(&path).unwrap();
        for uri in ["http://a.example/", "http://b.example/"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&record("response", uri, b"HTTP/1.1 200 OK\r\n\r\n")).unwrap();
            file.write_all(&encoder.finish().unwrap()).unwrap();
        }
        drop(file);

        let urls: Vec<String> = open_archive(&path)
            .unwrap()
            .map(|r| r.unwrap().url)
            .collect();
        assert_eq!(urls, vec!["http://a.example/", "http://b.example/"]);
    }

    #[test]
    fn test_open_missing_archive_fails() {
        let result = open_archive(Path::new("/nonexistent/crawl.warc"));
        assert!(matches!(result, Err(ArchiveError::Open { .. })));
    }
}
