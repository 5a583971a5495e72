//! Streaming, position-tracking HTML tokenizer.
//!
//! Yields start tags, end tags and character data in document order, with the
//! 1-based line and 0-based column (in characters) of every tag's `<`. The
//! tokenizer is lenient the way HTML parsers usually are: comments,
//! declarations, processing instructions and marked sections are skipped,
//! a stray `<` is text, and an unterminated construct at the end of the input
//! ends the stream without an error.
//!
//! Exactly two conditions are unrecoverable and yield a [`ScanError`]:
//! a `<` inside a start tag's attribute list outside any quoted value, and a
//! `<![keyword[` marked section with an unknown keyword.
//!
//! `<script>` and `<style>` contents are raw text: everything up to the
//! matching end tag is a single [`HtmlEvent::Text`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::entities::unescape;
use crate::error_handling::ScanError;

static MARKED_SECTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([a-zA-Z_][-_.a-zA-Z0-9]*)")
        .expect("Failed to parse marked section regex - this is a bug")
});

/// Marked-section keywords closed by `]]>`.
const MARKED_SECTION_KEYWORDS: &[&str] = &["temp", "cdata", "ignore", "include", "rcdata"];
/// Conditional-section keywords closed by `]>`.
const CONDITIONAL_SECTION_KEYWORDS: &[&str] = &["if", "else", "endif"];

/// Elements whose content is not tokenized.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Location of a tag's opening `<` in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPosition {
    /// 1-based line
    pub line: usize,
    /// 0-based column, counted in characters
    pub column: usize,
}

impl fmt::Display for TagPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.column)
    }
}

/// An attribute as written in a start tag, with a lower-cased name and an
/// unescaped value (`None` for bare attributes such as `async`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub position: TagPosition,
}

impl StartTag {
    /// Returns the value of attribute `name`; when repeated, the last one wins.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent<'a> {
    StartTag(StartTag),
    EndTag { name: String, position: TagPosition },
    Text(&'a str),
}

/// Iterator over the [`HtmlEvent`]s of a document.
///
/// After an error the iterator is exhausted.
pub struct HtmlTokenizer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    raw_text: Option<&'static str>,
    queued: Option<HtmlEvent<'a>>,
    finished: bool,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

fn is_tag_name_end(b: u8) -> bool {
    is_space(b) || b == b'/' || b == b'>'
}

/// Outcome of trying to read a construct at the current position.
enum Step<'a> {
    Emit(HtmlEvent<'a>),
    Skip(usize),
    Incomplete,
}

impl<'a> HtmlTokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 0,
            raw_text: None,
            queued: None,
            finished: false,
        }
    }

    fn tag_position(&self) -> TagPosition {
        TagPosition {
            line: self.line,
            column: self.column,
        }
    }

    /// Moves to byte offset `to`, updating line and column.
    fn advance(&mut self, to: usize) {
        let consumed = &self.input[self.pos..to];
        match consumed.rfind('\n') {
            Some(last) => {
                self.line += consumed.bytes().filter(|&b| b == b'\n').count();
                self.column = consumed[last + 1..].chars().count();
            }
            None => self.column += consumed.chars().count(),
        }
        self.pos = to;
    }

    fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        self.input.get(from..)?.find(needle).map(|i| from + i)
    }

    /// Raw text up to the closing tag of `element`, or the closing tag itself.
    fn raw_text_step(&mut self, element: &'static str) -> Result<Step<'a>, ScanError> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut search = self.pos;
        while let Some(lt) = self.find_from(search, "</") {
            let name_start = lt + 2;
            let name_end = name_start + element.len();
            let matches_name = bytes
                .get(name_start..name_end)
                .is_some_and(|n| n.eq_ignore_ascii_case(element.as_bytes()));
            if matches_name && bytes.get(name_end).is_some_and(|&b| is_tag_name_end(b)) {
                if lt > self.pos {
                    let text = &input[self.pos..lt];
                    self.advance(lt);
                    return Ok(Step::Emit(HtmlEvent::Text(text)));
                }
                self.raw_text = None;
                return self.end_tag();
            }
            search = lt + 2;
        }
        Ok(Step::Incomplete)
    }

    fn markup_step(&mut self) -> Result<Step<'a>, ScanError> {
        let input = self.input;
        let rest = &input.as_bytes()[self.pos..];
        match rest.get(1) {
            None => Ok(Step::Incomplete),
            Some(b) if b.is_ascii_alphabetic() => self.start_tag(),
            Some(b'/') => self.end_tag(),
            Some(b'!') if rest.starts_with(b"<!--") => Ok(self
                .find_from(self.pos + 4, "-->")
                .map_or(Step::Incomplete, |end| Step::Skip(end + 3))),
            Some(b'!') if rest.starts_with(b"<![") => self.marked_section(),
            Some(b'!') | Some(b'?') => Ok(self
                .find_from(self.pos + 2, ">")
                .map_or(Step::Incomplete, |end| Step::Skip(end + 1))),
            Some(_) => {
                let text = &input[self.pos..self.pos + 1];
                self.advance(self.pos + 1);
                Ok(Step::Emit(HtmlEvent::Text(text)))
            }
        }
    }

    fn start_tag(&mut self) -> Result<Step<'a>, ScanError> {
        let position = self.tag_position();
        let input = self.input;
        let bytes = input.as_bytes();
        let len = bytes.len();

        let mut i = self.pos + 1;
        while i < len && !is_tag_name_end(bytes[i]) && bytes[i] != b'<' {
            i += 1;
        }
        let name = input[self.pos + 1..i].to_ascii_lowercase();

        let mut attributes = Vec::new();
        let mut self_closing = false;
        loop {
            let Some(&b) = bytes.get(i) else {
                return Ok(Step::Incomplete);
            };
            match b {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                b'/' => i += 1,
                b'<' => {
                    return Err(ScanError::MalformedStartTag {
                        line: position.line,
                        column: position.column,
                    })
                }
                b if is_space(b) => i += 1,
                _ => {
                    let name_start = i;
                    while i < len && !is_tag_name_end(bytes[i]) && !matches!(bytes[i], b'=' | b'<') {
                        i += 1;
                    }
                    let attr_name = input[name_start..i].to_ascii_lowercase();
                    while i < len && is_space(bytes[i]) {
                        i += 1;
                    }
                    let mut value = None;
                    if bytes.get(i) == Some(&b'=') {
                        i += 1;
                        while i < len && is_space(bytes[i]) {
                            i += 1;
                        }
                        match bytes.get(i) {
                            None => return Ok(Step::Incomplete),
                            Some(&quote) if quote == b'"' || quote == b'\'' => {
                                let Some(close) = input[i + 1..].find(quote as char) else {
                                    return Ok(Step::Incomplete);
                                };
                                value = Some(unescape(&input[i + 1..i + 1 + close]));
                                i += close + 2;
                            }
                            Some(_) => {
                                let value_start = i;
                                while i < len && !is_space(bytes[i]) && !matches!(bytes[i], b'>' | b'<') {
                                    i += 1;
                                }
                                value = Some(unescape(&input[value_start..i]));
                            }
                        }
                    }
                    attributes.push(Attribute {
                        name: attr_name,
                        value,
                    });
                }
            }
        }

        self.advance(i);
        if self_closing {
            self.queued = Some(HtmlEvent::EndTag {
                name: name.clone(),
                position,
            });
        } else {
            self.raw_text = RAW_TEXT_ELEMENTS.iter().copied().find(|e| *e == name);
        }
        Ok(Step::Emit(HtmlEvent::StartTag(StartTag {
            name,
            attributes,
            self_closing,
            position,
        })))
    }

    fn end_tag(&mut self) -> Result<Step<'a>, ScanError> {
        let position = self.tag_position();
        let input = self.input;
        let bytes = input.as_bytes();
        let name_start = self.pos + 2;

        match bytes.get(name_start) {
            None => return Ok(Step::Incomplete),
            Some(b'>') => return Ok(Step::Skip(name_start + 1)),
            Some(b) if !b.is_ascii_alphabetic() => {
                // bogus comment such as </ 3>
                return Ok(self
                    .find_from(name_start, ">")
                    .map_or(Step::Incomplete, |end| Step::Skip(end + 1)));
            }
            Some(_) => {}
        }

        let mut name_end = name_start;
        while name_end < bytes.len() && !is_tag_name_end(bytes[name_end]) {
            name_end += 1;
        }
        let Some(close) = self.find_from(name_end, ">") else {
            return Ok(Step::Incomplete);
        };
        let name = input[name_start..name_end].to_ascii_lowercase();
        self.advance(close + 1);
        Ok(Step::Emit(HtmlEvent::EndTag { name, position }))
    }

    fn marked_section(&mut self) -> Result<Step<'a>, ScanError> {
        let position = self.tag_position();
        let input = self.input;
        let after = &input[self.pos + 3..];
        let keyword = MARKED_SECTION_NAME
            .captures(after)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());

        let terminator = match keyword.as_deref() {
            Some(k) if MARKED_SECTION_KEYWORDS.contains(&k) => "]]>",
            Some(k) if CONDITIONAL_SECTION_KEYWORDS.contains(&k) => "]>",
            _ => {
                if keyword.is_none() && after.trim().is_empty() {
                    return Ok(Step::Incomplete);
                }
                return Err(ScanError::UnknownMarkedSection {
                    keyword: keyword.unwrap_or_default(),
                    line: position.line,
                    column: position.column,
                });
            }
        };
        Ok(self
            .find_from(self.pos + 3, terminator)
            .map_or(Step::Incomplete, |end| Step::Skip(end + terminator.len())))
    }
}

impl<'a> Iterator for HtmlTokenizer<'a> {
    type Item = Result<HtmlEvent<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        loop {
            if self.finished || self.pos >= self.input.len() {
                self.finished = true;
                return None;
            }

            let input = self.input;
            let step = if let Some(element) = self.raw_text {
                self.raw_text_step(element)
            } else {
                match input[self.pos..].find('<') {
                    Some(0) => self.markup_step(),
                    Some(lt) => {
                        let text = &input[self.pos..self.pos + lt];
                        self.advance(self.pos + lt);
                        Ok(Step::Emit(HtmlEvent::Text(text)))
                    }
                    None => {
                        let text = &input[self.pos..];
                        self.advance(input.len());
                        Ok(Step::Emit(HtmlEvent::Text(text)))
                    }
                }
            };

            match step {
                Ok(Step::Emit(event)) => return Some(Ok(event)),
                Ok(Step::Skip(to)) => self.advance(to),
                Ok(Step::Incomplete) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
