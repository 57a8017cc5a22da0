//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Anything that goes wrong inside the browser (launching it, navigating,
//! evaluating, printing) collapses into [`ErrorKind::Render`]. Callers get the
//! underlying message, but no finer taxonomy: there is nothing different they
//! could do about a crashed renderer versus a timed-out navigation.

use derive_more::{Display, Error};
use std::fmt::Display as FmtDisplay;
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The conversion was configured incorrectly (e.g. both or neither of
    /// inline HTML and an HTML file were provided). Fix the call.
    #[display("invalid input: {_0}")]
    InvalidInput(#[error(not(source))] String),
    /// A referenced input file (HTML document or extra stylesheet) is missing.
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    /// The browser failed to navigate, evaluate or print the document.
    #[display("PDF render error: {_0}")]
    Render(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Wrap any browser-side failure into the catch-all render error, keeping
    /// its message.
    #[track_caller]
    pub(crate) fn render(cause: impl FmtDisplay) -> Error {
        exn::Exn::from(ErrorKind::Render(cause.to_string()))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::NotFound(PathBuf::from("/tmp/page.html")).to_string(),
            "file not found: /tmp/page.html"
        );
        assert_eq!(ErrorKind::Render("boom".to_string()).to_string(), "PDF render error: boom");
        assert_eq!(ErrorKind::Io.to_string(), "I/O error");
    }

    #[test]
    fn render_keeps_cause_message() {
        let err = ErrorKind::render("net::ERR_FILE_NOT_FOUND");
        assert_eq!(*err, ErrorKind::Render("net::ERR_FILE_NOT_FOUND".to_string()));
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!ErrorKind::Io.is_retryable());
        assert!(!ErrorKind::Render(String::new()).is_retryable());
        assert!(!ErrorKind::ChromeNotFound.is_retryable());
    }
}
