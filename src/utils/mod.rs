//! Utility functions for byte/text handling.
//!
//! This module provides:
//! - Latin-1 decoding of archived bodies and re-encoding of script text
//! - Whitespace trimming and HTML comment-wrapper stripping for script bodies

pub mod text;

pub use text::{latin1_decode, latin1_encode, strip_comment_wrapper, trim_whitespace};
