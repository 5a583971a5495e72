//! MIME sniffing of bodies that failed the syntax check.
//!
//! Only one question matters to the writer: does an unparsable body look like
//! mis-captured markup (an error page, a soft 404, an HTML fragment) rather
//! than broken JavaScript? [`MimeOracle`] is that seam. [`MarkupSniffer`]
//! follows the WHATWG "identifying an unknown MIME type" rules for the
//! markup-relevant signatures, and like libmagic also looks for HTML markers
//! anywhere in the first 4 KiB, past a UTF-8 byte order mark.

/// Best-guess MIME type of a byte sequence.
pub trait MimeOracle: Send + Sync {
    fn sniff(&self, body: &[u8]) -> String;
}

pub const MIME_HTML: &str = "text/html";
pub const MIME_XML: &str = "text/xml";
pub const MIME_APPLICATION_XML: &str = "application/xml";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_BINARY: &str = "application/octet-stream";

/// Returns whether `mime` denotes markup whose unparsable bodies are dropped
/// instead of quarantined.
pub fn is_markup_mime(mime: &str) -> bool {
    matches!(mime, MIME_HTML | MIME_XML | MIME_APPLICATION_XML)
}

/// Tag names that identify HTML when they open the body (case-insensitive),
/// each followed by a tag-terminating byte.
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Markers found anywhere in the first [`SEARCH_WINDOW`] bytes
/// (case-insensitive). Those ending in a name need a '>' or whitespace after.
const HTML_MARKERS: &[&[u8]] = &[
    b"<!doctype html",
    b"<html",
    b"<head",
    b"<title",
    b"<script",
    b"<style",
    b"<table",
    b"<a href=",
];

/// Bytes searched for embedded markup.
const SEARCH_WINDOW: usize = 4096;
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const XML_SIGNATURE: &[u8] = b"<?xml";
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Whitespace skipped before matching signatures.
fn is_leading_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

/// Bytes that never occur in text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn find_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

fn is_tag_terminator(b: u8) -> bool {
    b == b'>' || is_leading_space(b)
}

/// Whether any [`HTML_MARKERS`] entry occurs in `window`.
fn contains_html_marker(window: &[u8]) -> bool {
    HTML_MARKERS.iter().any(|marker| {
        let mut from = 0;
        while let Some(found) = find_ignore_case(&window[from..], marker) {
            let end = from + found + marker.len();
            if marker.ends_with(b"=") {
                return true;
            }
            match window.get(end) {
                Some(&next) if is_tag_terminator(next) => return true,
                Some(_) => from = end,
                None => return false,
            }
        }
        false
    })
}

/// A body that opens with an element and later closes the same element,
/// like `<span>blocked</span>`.
fn is_element_fragment(trimmed: &[u8], window: &[u8]) -> bool {
    let Some(rest) = trimmed.strip_prefix(b"<") else {
        return false;
    };
    if !rest.first().is_some_and(u8::is_ascii_alphabetic) {
        return false;
    }
    let name_len = rest
        .iter()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    match rest.get(name_len) {
        Some(&next) if is_tag_terminator(next) || next == b'/' => {}
        _ => return false,
    }
    let mut closing = b"</".to_vec();
    closing.extend_from_slice(&rest[..name_len]);
    find_ignore_case(window, &closing).is_some()
}

/// Sniffer for markup, XML, PDF, plain text and binary bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupSniffer;

impl MarkupSniffer {
    fn sniff_static(body: &[u8]) -> &'static str {
        let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
        let start = body
            .iter()
            .position(|&b| !is_leading_space(b))
            .unwrap_or(body.len());
        let trimmed = &body[start..];

        for signature in HTML_SIGNATURES {
            if starts_with_ignore_case(trimmed, signature) {
                // "<!--" needs no terminator; tag names need a space or '>'
                if *signature == b"<!--".as_slice() {
                    return MIME_HTML;
                }
                if let Some(&next) = trimmed.get(signature.len()) {
                    if next == b' ' || next == b'>' {
                        return MIME_HTML;
                    }
                }
            }
        }

        let window = &body[..body.len().min(SEARCH_WINDOW)];
        if contains_html_marker(window) || is_element_fragment(trimmed, window) {
            return MIME_HTML;
        }

        if trimmed.starts_with(XML_SIGNATURE) {
            return MIME_XML;
        }
        if body.starts_with(PDF_SIGNATURE) {
            return MIME_PDF;
        }
        if body.iter().any(|&b| is_binary_byte(b)) {
            return MIME_BINARY;
        }
        MIME_TEXT
    }
}

impl MimeOracle for MarkupSniffer {
    fn sniff(&self, body: &[u8]) -> String {
        Self::sniff_static(body).to_string()
    }
}
