//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the narrow set of
//! filesystem operations the rotation store needs: listing category
//! directories, enumerating the files inside them, moving things around, and
//! reading/writing per-file attributes.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::{MockBackend, Op};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Unified interface for storage backends.
///
/// Every operation is synchronous and runs to completion on the calling
/// thread; the store that drives a backend is single-threaded by design and
/// the embedding application serializes calls into it.
///
/// # Path Handling
/// All paths are relative to the library root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation, and every path they return is relative too.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shuffler_storage::{backend::StorageBackend, error::Result};
///
/// fn count_images(backend: &dyn StorageBackend) -> Result<usize> {
///     let mut total = 0;
///     for dir in backend.list_dirs(Path::new("upcoming"))? {
///         total += backend.list_files(&dir)?.len();
///     }
///     Ok(total)
/// }
/// ```
pub trait StorageBackend {
    /// Absolute location of the library root, for display purposes only.
    fn root(&self) -> &Path;

    /// Immediate, non-hidden subdirectories of `path`, sorted by name.
    ///
    /// A directory that doesn't exist lists as empty rather than erroring.
    fn list_dirs(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Every regular file beneath `path`, recursively, sorted by path.
    ///
    /// Hidden entries are skipped (and hidden directories are not descended
    /// into), as are package-like bundle directories. A directory that
    /// doesn't exist lists as empty.
    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Check if a file or directory exists.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// `true` if `path` is a directory with no entries of any kind (hidden
    /// entries included).
    fn is_empty_dir(&self, path: &Path) -> Result<bool>;

    /// Create a directory and any missing parents. Succeeds if it already
    /// exists as a directory.
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Move a file or directory.
    ///
    /// Never overwrites: returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists)
    /// if `to` is taken. The parent of `to` must already exist.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Read an extended attribute as UTF-8 text. Returns `None` if the
    /// attribute isn't set (or isn't valid UTF-8).
    fn get_attr(&self, path: &Path, key: &str) -> Result<Option<String>>;

    /// Write an extended attribute.
    fn set_attr(&self, path: &Path, key: &str, value: &str) -> Result<()>;

    /// Absolute path of a library-relative path, for handing to viewers.
    fn absolute(&self, path: &Path) -> PathBuf {
        self.root().join(path)
    }
}
