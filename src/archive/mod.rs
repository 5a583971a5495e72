//! Web archive input: WARC records and the HTTP responses inside them.
//!
//! This module provides:
//! - [`open_archive`] / [`WarcReader`]: the record stream of one WARC file
//! - [`parse_response`]: status, headers and decoded body of a response record
//! - [`DecodedResponse`]: what the scanner needs from a response record

mod http;
mod warc;

pub use http::{parse_response, HttpResponse};
pub use warc::{open_archive, WarcReader};

use crate::config::{HEADER_DATE, WARC_TYPE_RESPONSE};
use crate::error_handling::HttpParseError;
use crate::utils::latin1_decode;

/// Type of a WARC record. Only responses are scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Response,
    Other(String),
}

impl RecordType {
    pub fn from_header(value: &str) -> Self {
        if value.eq_ignore_ascii_case(WARC_TYPE_RESPONSE) {
            RecordType::Response
        } else {
            RecordType::Other(value.to_string())
        }
    }
}

/// One record of a web archive.
#[derive(Debug, Clone)]
pub struct ArchiveRecord {
    pub record_type: RecordType,
    /// `WARC-Target-URI`, empty when absent
    pub url: String,
    pub content_length: u64,
    pub payload: Vec<u8>,
}

/// A response record reduced to what script extraction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub url: String,
    /// The response's `Date` header, verbatim
    pub date: Option<String>,
    /// The body decoded one byte per character
    pub body: String,
}

impl DecodedResponse {
    /// Decodes the HTTP response carried by `record`.
    ///
    /// # Errors
    ///
    /// Returns an `HttpParseError` if the payload is not a parsable response.
    pub fn from_record(record: &ArchiveRecord) -> Result<Self, HttpParseError> {
        let response = parse_response(&record.payload)?;
        Ok(Self {
            url: record.url.clone(),
            date: response.header(HEADER_DATE).map(str::to_string),
            body: latin1_decode(&response.body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_is_case_insensitive() {
        assert_eq!(RecordType::from_header("response"), RecordType::Response);
        assert_eq!(RecordType::from_header("Response"), RecordType::Response);
        assert_eq!(
            RecordType::from_header("warcinfo"),
            RecordType::Other("warcinfo".to_string())
        );
    }

    #[test]
    fn test_decoded_response_keeps_date_and_latin1_body() {
        let record = ArchiveRecord {
            record_type: RecordType::Response,
            url: "http://example.com/".to_string(),
            content_length: 0,
            payload: b"HTTP/1.1 200 OK\r\ndate: Tue, 01 Jan 2019 00:00:00 GMT\r\n\r\ncaf\xe9".to_vec(),
        };
        let decoded = DecodedResponse::from_record(&record).unwrap();
        assert_eq!(decoded.url, "http://example.com/");
        assert_eq!(decoded.date.as_deref(), Some("Tue, 01 Jan 2019 00:00:00 GMT"));
        assert_eq!(decoded.body, "caf\u{e9}");
    }

    #[test]
    fn test_response_without_date() {
        let record = ArchiveRecord {
            record_type: RecordType::Response,
            url: "http://example.com/".to_string(),
            content_length: 0,
            payload: b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec(),
        };
        assert_eq!(DecodedResponse::from_record(&record).unwrap().date, None);
    }
}
