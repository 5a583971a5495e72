//! Byte/text helpers shared by the scanner and the writer.
//!
//! Archived bodies are treated as single-byte-per-character (Latin-1) text:
//! every byte maps to the code point of the same value, so decoding never
//! fails and re-encoding a slice of the decoded text yields the original bytes.

const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &[u8] = b"-->";

/// Decodes bytes as Latin-1 (ISO-8859-1).
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encodes text as Latin-1.
///
/// Characters above U+00FF cannot occur in text produced by [`latin1_decode`];
/// they only appear after entity decoding of attribute values and are written
/// as XML character references (`&#NNNN;`).
pub fn latin1_encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            out.extend_from_slice(format!("&#{code};").as_bytes());
        }
    }
    out
}

/// ASCII whitespace including vertical tab, which `u8::is_ascii_whitespace` omits.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Trims leading and trailing ASCII whitespace (space, tab, LF, CR, VT, FF).
pub fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| !is_space(b))
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Trims a script body and removes one `<!-- ... -->` wrapper around all of it.
///
/// Old pages hide script bodies from non-scripting browsers inside an HTML
/// comment. The wrapper is removed only when the trimmed body both starts with
/// `<!--` and ends with `-->`; the interior is trimmed again. A body too short
/// to hold both markers without overlap (such as `<!-->`) becomes empty.
pub fn strip_comment_wrapper(body: &[u8]) -> &[u8] {
    let body = trim_whitespace(body);
    if body.starts_with(COMMENT_OPEN) && body.ends_with(COMMENT_CLOSE) {
        let inner_end = body.len() - COMMENT_CLOSE.len();
        if inner_end <= COMMENT_OPEN.len() {
            return &[];
        }
        return trim_whitespace(&body[COMMENT_OPEN.len()..inner_end]);
    }
    body
}
