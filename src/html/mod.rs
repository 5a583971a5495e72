//! HTML tokenization for script discovery.

mod entities;
mod tokenizer;

pub use entities::unescape;
pub use tokenizer::{Attribute, HtmlEvent, HtmlTokenizer, StartTag, TagPosition};
