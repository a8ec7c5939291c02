//! Parser diagnostics: a categorised [`ErrorCode`], a builder-constructed
//! [`ParseError`] carrying full provenance, and — at the crate's public
//! boundary — a `thiserror`-backed [`ParserError`] rather than a
//! hand-rolled `Display`/`Error` impl.

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{ParseError, ParseErrorBuilder, Severity};

/// The error type returned from the crate's public parsing entry points.
///
/// Internally every handler threads a plain [`ParseError`] (it doesn't know
/// how to render its own `FileId` — that requires the registry living on
/// [`crate::parser::Parser`]). At the API boundary the file id is resolved
/// to a displayable string and folded into this type: errors from handler
/// code are caught at the dispatcher and re-raised with provenance attached.
#[derive(Debug, thiserror::Error)]
#[error("{rendered}")]
pub struct ParserError {
    rendered: String,
    pub inner: ParseError,
}

impl ParserError {
    pub fn new(inner: ParseError, file_display: &str) -> Self {
        Self {
            rendered: inner.format(file_display),
            inner,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.inner.code
    }
}
