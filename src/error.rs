//! CLI Error Types
//!
//! The library error is kept as the child of these frames, so the printed
//! error tree always ends in the underlying cause.

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration file or environment could not be loaded.
    #[display("invalid configuration")]
    Config,
    /// The conversion itself failed.
    #[display("HTML to PDF conversion failed")]
    Convert,
}
