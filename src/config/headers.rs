//! Header name constants.
//!
//! Names of the WARC record headers and HTTP response headers the extractor
//! reads. Lookups against both are case-insensitive.

// WARC record headers
/// WARC record type (`response`, `request`, `warcinfo`, ...)
pub const WARC_TYPE: &str = "WARC-Type";
/// URI of the captured resource
pub const WARC_TARGET_URI: &str = "WARC-Target-URI";
/// Length in bytes of the record's content block
pub const WARC_CONTENT_LENGTH: &str = "Content-Length";
/// Record type whose payload is an HTTP response
pub const WARC_TYPE_RESPONSE: &str = "response";

// HTTP response headers
/// Response generation date, used as the retrieval date of inline scripts
pub const HEADER_DATE: &str = "Date";
/// Declared body length
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
/// Transfer coding (only `chunked` is decoded)
pub const HEADER_TRANSFER_ENCODING: &str = "Transfer-Encoding";
/// Content coding (`gzip`, `x-gzip` and `deflate` are decoded)
pub const HEADER_CONTENT_ENCODING: &str = "Content-Encoding";
