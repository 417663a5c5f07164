//! Codec Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Every failure in this crate is a validation failure:
//! the input is either well-formed or it isn't.

use derive_more::{Display, Error};

/// A codec error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A weight was not a positive integer.
    #[display("invalid weight: {_0:?}")]
    InvalidWeight(#[error(not(source))] String),
    /// A tag was empty (after trimming) or contained a reserved character.
    #[display("invalid tag: {_0:?}")]
    InvalidTag(#[error(not(source))] String),
    /// A directory name does not follow the category grammar.
    #[display("malformed category directory name: {_0:?}")]
    MalformedCategory(#[error(not(source))] String),
    /// An extended attribute held a value that could not be parsed.
    #[display("invalid value for attribute '{key}': {value:?}")]
    InvalidAttribute {
        /// The attribute key.
        key: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Names and values don't change between attempts.
        false
    }
}
