//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Most failures inside the store are
//! reported through the [`DiagnosticSink`](crate::DiagnosticSink) and
//! recovered from; the kinds here are what's left over when an operation
//! can't produce its result at all.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a store failure.
///
/// ### Operational Errors
/// - [`ErrorKind::NotCategorized`]
/// - [`ErrorKind::MissingFile`]
/// - [`ErrorKind::Relocation`]
/// - [`ErrorKind::Rotation`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Codec`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend operation (list, rename, attribute access) failed.
    #[display("storage operation failed")]
    Storage,
    /// A weight, tag or attribute value was rejected.
    #[display("invalid categorization value")]
    Codec,
    /// The file isn't inside `upcoming/<category>/` or `shown/<category>/`
    /// with a decodable category name.
    #[display("not inside a category directory: {}", _0.display())]
    NotCategorized(#[error(not(source))] PathBuf),
    /// The file a key refers to is gone (moved or deleted outside the store).
    #[display("file no longer exists: {}", _0.display())]
    MissingFile(#[error(not(source))] PathBuf),
    /// Moving a file into its new category (or the trash) failed; it stays
    /// where it was.
    #[display("could not relocate file")]
    Relocation,
    /// A pool rotation stopped part-way through.
    #[display("pool rotation aborted")]
    Rotation,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A rebuild picks up whatever moved the file.
        matches!(self, Self::MissingFile(_))
    }
}
