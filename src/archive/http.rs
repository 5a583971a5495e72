//! Splitting archived HTTP responses into headers and a decoded body.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::config::{HEADER_CONTENT_ENCODING, HEADER_CONTENT_LENGTH, HEADER_TRANSFER_ENCODING};
use crate::error_handling::HttpParseError;

/// Upper bound on response header count; more is a parse error.
const MAX_HEADERS: usize = 256;

/// A parsed HTTP response with its body de-chunked and decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the first value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parses the HTTP response carried in a WARC response record.
///
/// The body is bounded by `Content-Length` when present, de-chunked when the
/// transfer coding is `chunked`, and decompressed for `gzip`, `x-gzip` and
/// `deflate` content codings. Unknown content codings are passed through.
///
/// # Errors
///
/// Returns an `HttpParseError` if the header block is incomplete or malformed,
/// the chunked framing is broken, or decompression fails.
pub fn parse_response(payload: &[u8]) -> Result<HttpResponse, HttpParseError> {
    let mut header_buf = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut header_buf);
    let header_len = match parsed.parse(payload)? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Err(HttpParseError::Incomplete),
    };

    let response = HttpResponse {
        status: parsed.code.unwrap_or_default(),
        headers: parsed
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).trim().to_string()))
            .collect(),
        body: Vec::new(),
    };

    let raw = &payload[header_len..];
    let chunked = response
        .header(HEADER_TRANSFER_ENCODING)
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
    let body = if chunked {
        dechunk(raw)?
    } else {
        let declared = response
            .header(HEADER_CONTENT_LENGTH)
            .and_then(|v| v.parse::<usize>().ok());
        match declared {
            Some(len) => raw[..len.min(raw.len())].to_vec(),
            None => raw.to_vec(),
        }
    };

    let body = match response.header(HEADER_CONTENT_ENCODING) {
        Some(encoding) => decode_content(encoding, body)?,
        None => body,
    };
    Ok(HttpResponse { body, ..response })
}

/// Removes chunked transfer coding.
///
/// A body that simply stops after a complete chunk (a capture cut short) is
/// accepted; a chunk that is cut short is not.
fn dechunk(mut data: &[u8]) -> Result<Vec<u8>, HttpParseError> {
    let mut body = Vec::new();
    loop {
        if data.is_empty() {
            return Ok(body);
        }
        let line_end = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| HttpParseError::Chunked("unterminated chunk size line".to_string()))?;
        let line = String::from_utf8_lossy(&data[..line_end]);
        let size_field = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| HttpParseError::Chunked(format!("invalid chunk size {size_field:?}")))?;
        data = &data[line_end + 1..];

        if size == 0 {
            return Ok(body);
        }
        if data.len() < size {
            return Err(HttpParseError::Chunked(format!(
                "chunk of {size} bytes truncated to {}",
                data.len()
            )));
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size..];
        data = data.strip_prefix(b"\r").unwrap_or(data);
        data = data.strip_prefix(b"\n").unwrap_or(data);
    }
}

fn decode_content(encoding: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpParseError> {
    let encoding = encoding.trim().to_ascii_lowercase();
    let decode_error = |source| HttpParseError::Decode {
        encoding: encoding.clone(),
        source,
    };
    let mut decoded = Vec::new();
    match encoding.as_str() {
        "gzip" | "x-gzip" => {
            GzDecoder::new(body.as_slice())
                .read_to_end(&mut decoded)
                .map_err(decode_error)?;
        }
        "deflate" => {
            // Servers send both zlib-wrapped and raw deflate under this name
            if ZlibDecoder::new(body.as_slice())
                .read_to_end(&mut decoded)
                .is_err()
            {
                decoded.clear();
                DeflateDecoder::new(body.as_slice())
                    .read_to_end(&mut decoded)
                    .map_err(decode_error)?;
            }
        }
        _ => return Ok(body),
    }
    Ok(decoded)
}
