//! Derivation of output paths from script URLs.
//!
//! A derived path has the shape `shard1/shard2/escaped-host/filename`:
//!
//! - `shard1`/`shard2` are the first two characters of the lower-cased
//!   authority with a leading `www`, all `.`/`-` and all non-ASCII characters
//!   removed (padded with `_` when shorter than two characters).
//! - `escaped-host` is the percent-escaped lower-cased authority, truncated to
//!   89 characters.
//! - `filename` is the percent-escaped URL path without leading/trailing `/`,
//!   plus `#<disambiguator>` for inline scripts, plus `.js` when missing, keeping
//!   only its last 92 characters.
//!
//! Query strings and fragments never participate. The derivation is pure: the
//! same `(url, disambiguator)` always yields the same path, which is what makes
//! path-level deduplication work across runs.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{Position, Url};

use crate::config::{
    MAX_FILENAME_LENGTH, MAX_HOST_SEGMENT_LENGTH, MIN_SHARD_SOURCE_LENGTH, SCRIPT_EXTENSION,
    SHARD_PAD_CHAR,
};

/// Characters left unescaped: ASCII alphanumerics plus `_`, `.`, `-` and `%`.
///
/// `%` stays so already-escaped sequences from the URL are not escaped twice;
/// `/` and `#` are escaped so the file name is a single path component.
const PATH_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'%');

const WWW_PREFIX: &str = "www";

/// Percent-escapes `s` with [`PATH_ESCAPE_SET`].
fn escape(s: &str) -> String {
    utf8_percent_encode(s, PATH_ESCAPE_SET).to_string()
}

/// Returns the lower-cased authority (`user:pass@host:port`) of `url`.
fn authority(url: &Url) -> String {
    url[Position::BeforeUsername..Position::AfterPort].to_lowercase()
}

/// Returns the two shard characters for an authority.
fn shard_chars(authority: &str) -> (char, char) {
    let without_www = authority.strip_prefix(WWW_PREFIX).unwrap_or(authority);
    let mut normalized: Vec<char> = without_www
        .chars()
        .filter(|c| c.is_ascii() && *c != '.' && *c != '-')
        .collect();
    while normalized.len() < MIN_SHARD_SOURCE_LENGTH {
        normalized.push(SHARD_PAD_CHAR);
    }
    (normalized[0], normalized[1])
}

/// Keeps at most the first `max` bytes of an ASCII string.
fn truncate_front(s: &str, max: usize) -> &str {
    &s[..s.len().min(max)]
}

/// Keeps at most the last `max` bytes of an ASCII string.
fn truncate_back(s: &str, max: usize) -> &str {
    &s[s.len().saturating_sub(max)..]
}

/// Derives the relative output path for a script.
///
/// # Arguments
///
/// * `url` - Absolute URL of the script (the `src` URL for external scripts,
///   the document URL for inline scripts)
/// * `disambiguator` - Start-tag anchor of an inline script (`"line,column"`),
///   `None` for external scripts
///
/// # Returns
///
/// A relative path of four `/`-separated segments, always ending in `.js`.
pub fn derive_path(url: &Url, disambiguator: Option<&str>) -> String {
    let authority = authority(url);
    let (shard1, shard2) = shard_chars(&authority);
    let escaped_host = escape(&authority);
    let host_segment = truncate_front(&escaped_host, MAX_HOST_SEGMENT_LENGTH);

    let mut raw_name = url.path().trim_matches('/').to_string();
    if let Some(disambiguator) = disambiguator {
        raw_name.push('#');
        raw_name.push_str(disambiguator);
    }
    let mut filename = escape(&raw_name);
    if !filename.ends_with(SCRIPT_EXTENSION) {
        filename.push_str(SCRIPT_EXTENSION);
    }
    let filename = truncate_back(&filename, MAX_FILENAME_LENGTH);

    format!("{shard1}/{shard2}/{host_segment}/{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(url: &str, disambiguator: Option<&str>) -> String {
        let url = Url::parse(url).expect("test URL should parse");
        derive_path(&url, disambiguator)
    }

    #[test]
    fn test_derive_path_is_deterministic() {
        let a = derive("http://cdn.example.org/lib/app.min.js?v=3", None);
        let b = derive("http://cdn.example.org/lib/app.min.js?v=3", None);
        assert_eq!(a, b);
        let c = derive("http://example.org/page", Some("4,10"));
        let d = derive("http://example.org/page", Some("4,10"));
        assert_eq!(c, d);
    }

    #[test]
    fn test_www_label_is_stripped_for_sharding() {
        assert_eq!(
            derive("http://www.example.com/app.js", None),
            "e/x/www.example.com/app.js"
        );
    }

    #[test]
    fn test_host_is_lower_cased() {
        assert_eq!(
            derive("http://WWW.Example.COM/app.js", None),
            "e/x/www.example.com/app.js"
        );
    }

    #[test]
    fn test_dots_and_dashes_do_not_count_for_shards() {
        assert_eq!(
            derive("http://a-b.c/x.js", None),
            "a/b/a-b.c/x.js"
        );
        assert_eq!(derive("http://a.b/x.js", None), "a/b/a.b/x.js");
    }

    #[test]
    fn test_short_host_is_padded() {
        assert_eq!(derive("http://x/s.js", None), "x/_/x/s.js");
        assert_eq!(derive("http://www/s.js", None), "_/_/www/s.js");
    }

    #[test]
    fn test_port_and_userinfo_are_escaped_in_host_segment() {
        assert_eq!(
            derive("http://example.com:8080/s.js", None),
            "e/x/example.com%3A8080/s.js"
        );
        assert_eq!(
            derive("http://bob@example.com/s.js", None),
            "b/o/bob%40example.com/s.js"
        );
    }

    #[test]
    fn test_authority_is_the_normalized_url_form() {
        // Default ports are dropped and IDN hosts appear in punycode
        assert_eq!(
            derive("http://example.com:80/a.js", None),
            derive("http://example.com/a.js", None)
        );
        assert_eq!(
            derive("https://example.com:443/a.js", None),
            "e/x/example.com/a.js"
        );
        assert_eq!(
            derive("http://b\u{fc}cher.example/a.js", None),
            "x/n/xn--bcher-kva.example/a.js"
        );
    }

    #[test]
    fn test_nested_path_becomes_single_component() {
        assert_eq!(
            derive("http://example.com/static/js/app.js", None),
            "e/x/example.com/static%2Fjs%2Fapp.js"
        );
    }

    #[test]
    fn test_extension_appended_when_missing() {
        assert_eq!(
            derive("http://example.com/loader.php", None),
            "e/x/example.com/loader.php.js"
        );
        assert_eq!(derive("http://example.com/", None), "e/x/example.com/.js");
        assert_eq!(derive("http://example.com", None), "e/x/example.com/.js");
    }

    #[test]
    fn test_query_and_fragment_are_ignored() {
        assert_eq!(
            derive("http://example.com/a.js?x=1#frag", None),
            derive("http://example.com/a.js", None)
        );
    }

    #[test]
    fn test_inline_disambiguator_is_escaped_into_filename() {
        assert_eq!(
            derive("http://www.Example.com/page", Some("1,28")),
            "e/x/www.example.com/page%231%2C28.js"
        );
    }

    #[test]
    fn test_distinct_anchors_yield_distinct_paths() {
        let a = derive("http://example.com/page", Some("3,0"));
        let b = derive("http://example.com/page", Some("7,4"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_existing_escapes_are_preserved() {
        assert_eq!(
            derive("http://example.com/a%20b.js", None),
            "e/x/example.com/a%20b.js"
        );
        assert_eq!(
            derive("http://example.com/a~b.js", None),
            "e/x/example.com/a%7Eb.js"
        );
    }

    #[test]
    fn test_filename_keeps_last_92_characters() {
        let long_name = "d".repeat(200);
        let path = derive(&format!("http://example.com/{long_name}.js"), None);
        let filename = path.rsplit('/').next().expect("has filename");
        assert_eq!(filename.len(), 92);
        assert!(filename.ends_with(".js"));
    }

    #[test]
    fn test_host_segment_truncated_to_89_characters() {
        let label = "h".repeat(60);
        let host = format!("{label}.{label}.com");
        let path = derive(&format!("http://{host}/a.js"), None);
        let segments: Vec<&str> = path.split('/').collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[2].len(), 89);
        assert_eq!(segments[0], "h");
        assert_eq!(segments[1], "h");
    }
}
