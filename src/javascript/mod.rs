//! JavaScript syntax checking (does NOT run the checked script).
//!
//! The writer only needs a yes/no answer on whether a body parses as
//! JavaScript. [`SyntaxOracle`] is that seam; [`QuickJsValidator`] answers it
//! with QuickJS (via rquickjs).
//!
//! **Security measures:**
//! - Memory limit: 64MB per check runtime
//! - Wall-clock limit: 2 seconds per check, enforced by an interrupt handler
//! - A fresh runtime per check, so nothing leaks between scripts

mod runtime;
mod validate;

pub use validate::QuickJsValidator;

/// Result of a syntax check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxVerdict {
    /// The body parses as JavaScript.
    Valid,
    /// The body does not parse; carries the parser's message.
    Invalid(String),
    /// The checker itself failed (runtime creation, memory or time limit).
    /// Callers treat this like `Valid` so a checker failure never discards a script.
    Undetermined(String),
}

impl SyntaxVerdict {
    pub fn is_invalid(&self) -> bool {
        matches!(self, SyntaxVerdict::Invalid(_))
    }
}

/// Yes/no oracle for JavaScript syntax validity.
pub trait SyntaxOracle: Send + Sync {
    fn check(&self, body: &[u8]) -> SyntaxVerdict;
}
