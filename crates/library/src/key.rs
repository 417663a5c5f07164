use derive_more::Display;
use std::path::{Path, PathBuf};

use crate::layout;

/// Opaque handle to one image in the library.
///
/// Wraps the file's root-relative path. Display attribute edits leave it
/// valid; a weight or tag change moves the file, and the store updates the
/// key it was handed in place so the caller keeps a working handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{}", _0.display())]
pub struct Key(PathBuf);
impl Key {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Root-relative path of the file.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name without its extension, for display.
    pub fn name(&self) -> String {
        self.0.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// The path with the `upcoming/` or `shown/` prefix removed. Stays the
    /// same while a file moves between pools under its original name.
    pub fn pool_relative(&self) -> &Path {
        layout::pool_relative(&self.0)
    }

    pub(crate) fn update(&mut self, path: impl Into<PathBuf>) {
        self.0 = path.into();
    }
}
impl AsRef<Path> for Key {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
