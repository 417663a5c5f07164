//! In-memory snapshot of the `upcoming/` pool.
//!
//! The directory tree is the database; the [`Catalog`] is a cache of it,
//! rebuilt in full at startup, when a selected file turns out to be missing,
//! after a flip, and on request. In between, the store patches it as it moves
//! files around itself so that exhaustion of `upcoming/` is visible without a
//! rescan.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ErrorKind, Result};
use crate::layout::{self, Pool};
use exn::ResultExt;
use shuffler_codec::{Category, TagSet, Weight, is_supported_image};
use shuffler_storage::StorageBackend;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One category directory under `upcoming/` and the images inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Root-relative location, e.g. `upcoming/4-cats`.
    pub path: PathBuf,
    pub category: Category,
    /// Root-relative paths of every showable image, at any depth.
    pub files: Vec<PathBuf>,
}
impl Directory {
    pub fn weight(&self) -> Weight {
        self.category.weight
    }

    pub fn tags(&self) -> &TagSet {
        &self.category.tags
    }

    /// Probability mass of the directory in a weighted draw: its weight
    /// times its file count. Zero for the not-shown bucket.
    pub fn mass(&self) -> u64 {
        self.weight().get().map_or(0, |w| u64::from(w) * self.files.len() as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Sorted by path.
    directories: Vec<Directory>,
    /// Every tag seen in either pool.
    tags: TagSet,
    total: usize,
}

impl Catalog {
    /// Scan the library and build a fresh snapshot.
    ///
    /// Directories with malformed names and files that aren't images are
    /// reported and skipped. Only failing to list `upcoming/` itself is an
    /// error; `shown/` is read for its tag vocabulary alone and problems with
    /// it are ignored.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(backend: &dyn StorageBackend, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let mut catalog = Self::default();
        let dirs = backend.list_dirs(Pool::Upcoming.dir()).or_raise(|| ErrorKind::Storage)?;
        for dir in dirs {
            let Some(category) = decode_dir(&dir) else {
                sink.emit(Diagnostic::MalformedCategory { dir });
                continue;
            };
            let files = match backend.list_files(&dir) {
                Ok(files) => files,
                Err(e) => {
                    sink.emit(Diagnostic::ScanFailed { dir, error: e.to_string() });
                    continue;
                },
            };
            let mut images = Vec::with_capacity(files.len());
            for file in files {
                if is_supported_image(&file) {
                    images.push(file);
                } else {
                    sink.emit(Diagnostic::Unshowable { path: file });
                }
            }
            catalog.tags.extend_from(&category.tags);
            catalog.total += images.len();
            catalog.directories.push(Directory { path: dir, category, files: images });
        }
        match backend.list_dirs(Pool::Shown.dir()) {
            Ok(dirs) => {
                for category in dirs.iter().filter_map(|dir| decode_dir(dir)) {
                    catalog.tags.extend_from(&category.tags);
                }
            },
            Err(e) => tracing::debug!(error = ?e, "Couldn't read shown pool for tags"),
        }
        catalog.directories.sort_by(|a, b| a.path.cmp(&b.path));
        sink.emit(Diagnostic::Reloaded { directories: catalog.directories.len(), files: catalog.total });
        Ok(catalog)
    }

    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    /// Global tag vocabulary.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Number of showable images in `upcoming/`.
    pub fn total_files(&self) -> usize {
        self.total
    }

    pub fn directory(&self, path: &Path) -> Option<&Directory> {
        self.directories.iter().find(|d| d.path == path)
    }

    /// The first not-shown bucket holding any files.
    pub fn not_shown(&self) -> Option<&Directory> {
        self.directories.iter().find(|d| d.weight().is_not_shown() && !d.files.is_empty())
    }

    /// Drop a file that the store has moved away. Returns `false` if the
    /// snapshot didn't know about it.
    pub(crate) fn forget(&mut self, file: &Path) -> bool {
        let Some(dir) = self.directories.iter_mut().find(|d| file.starts_with(&d.path)) else {
            return false;
        };
        let before = dir.files.len();
        dir.files.retain(|f| f != file);
        let removed = before - dir.files.len();
        self.total -= removed;
        removed > 0
    }

    /// Record a file the store has just moved into place. Files landing in
    /// `shown/` only contribute their tags.
    pub(crate) fn admit(&mut self, file: &Path) {
        let Some(dir_path) = layout::category_dir(file) else {
            return;
        };
        let Some(category) = decode_dir(&dir_path) else {
            return;
        };
        self.tags.extend_from(&category.tags);
        if Pool::of(file) != Some(Pool::Upcoming) || !is_supported_image(file) {
            return;
        }
        match self.directories.binary_search_by(|d| d.path.cmp(&dir_path)) {
            Ok(index) => {
                let files = &mut self.directories[index].files;
                if let Err(pos) = files.binary_search_by(|f| f.as_path().cmp(file)) {
                    files.insert(pos, file.to_path_buf());
                    self.total += 1;
                }
            },
            Err(index) => {
                let dir = Directory { path: dir_path, category, files: vec![file.to_path_buf()] };
                self.directories.insert(index, dir);
                self.total += 1;
            },
        }
    }

    /// Carry tags over from an earlier snapshot; the vocabulary only grows
    /// within a session.
    pub(crate) fn absorb_tags(&mut self, tags: &TagSet) {
        self.tags.extend_from(tags);
    }
}

/// Decode the category of a `<pool>/<name>` directory from its last component.
pub(crate) fn decode_dir(dir: &Path) -> Option<Category> {
    dir.file_name().and_then(OsStr::to_str).and_then(|name| Category::decode(name).ok())
}

/// Remove category directories under `upcoming/` that have nothing in them
/// at all (hidden files count). Returns how many were removed.
///
/// Rating and tagging images one at a time leaves a trail of directories that
/// briefly held a single image; this clears them away.
#[tracing::instrument(level = "debug", skip_all)]
pub fn prune_empty(backend: &dyn StorageBackend, sink: &mut dyn DiagnosticSink) -> Result<usize> {
    let mut removed = 0;
    for dir in backend.list_dirs(Pool::Upcoming.dir()).or_raise(|| ErrorKind::Storage)? {
        match backend.is_empty_dir(&dir) {
            Ok(true) => {},
            Ok(false) => continue,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = ?e, "Couldn't check directory");
                continue;
            },
        }
        match backend.remove_dir(&dir) {
            Ok(()) => {
                removed += 1;
                sink.emit(Diagnostic::PrunedEmpty { dir });
            },
            Err(e) => sink.emit(Diagnostic::PruneFailed { dir, error: e.to_string() }),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Recorder;
    use shuffler_storage::backend::MockBackend;

    fn backend() -> MockBackend {
        MockBackend::with_files([
            "upcoming/1/a.jpg",
            "upcoming/1/b.jpg",
            "upcoming/4-cats/c.png",
            "upcoming/4-cats/nested/d.gif",
            "upcoming/4-cats/notes.txt",
            "upcoming/cats/e.jpg",
            "upcoming/not-shown/f.jpg",
            "shown/2-dogs-outdoor/g.jpg",
            "shown/garbage/h.jpg",
        ])
    }

    #[test]
    fn test_build() {
        let backend = backend();
        let mut sink = Recorder::new();
        let catalog = Catalog::build(&backend, &mut sink).unwrap();

        let paths: Vec<_> = catalog.directories().iter().map(|d| d.path.clone()).collect();
        assert_eq!(paths, vec![
            PathBuf::from("upcoming/1"),
            PathBuf::from("upcoming/4-cats"),
            PathBuf::from("upcoming/not-shown"),
        ]);
        let cats = catalog.directory(Path::new("upcoming/4-cats")).unwrap();
        assert_eq!(cats.files, vec![
            PathBuf::from("upcoming/4-cats/c.png"),
            PathBuf::from("upcoming/4-cats/nested/d.gif"),
        ]);
        assert_eq!(cats.mass(), 8);
        assert_eq!(catalog.total_files(), 5);
        assert_eq!(catalog.tags().to_string(), "Cats, Dogs, Outdoor");
        assert_eq!(catalog.not_shown().unwrap().files, vec![PathBuf::from("upcoming/not-shown/f.jpg")]);

        assert_eq!(sink.count(|d| matches!(d, Diagnostic::MalformedCategory { .. })), 1);
        assert_eq!(sink.count(|d| matches!(d, Diagnostic::Unshowable { .. })), 1);
        assert!(sink.diagnostics.contains(&Diagnostic::Reloaded { directories: 3, files: 5 }));
    }

    #[test]
    fn test_build_empty_library() {
        let backend = MockBackend::default();
        let catalog = Catalog::build(&backend, &mut Recorder::new()).unwrap();
        assert!(catalog.directories().is_empty());
        assert_eq!(catalog.total_files(), 0);
        assert!(catalog.not_shown().is_none());
    }

    #[test]
    fn test_forget_and_admit() {
        let backend = backend();
        let mut catalog = Catalog::build(&backend, &mut Recorder::new()).unwrap();

        assert!(catalog.forget(Path::new("upcoming/1/a.jpg")));
        assert!(!catalog.forget(Path::new("upcoming/1/a.jpg")));
        assert_eq!(catalog.total_files(), 4);

        catalog.admit(Path::new("upcoming/1/a.jpg"));
        catalog.admit(Path::new("upcoming/3-birds/z.jpg"));
        catalog.admit(Path::new("shown/5-fish/y.jpg"));
        assert_eq!(catalog.total_files(), 6);
        assert_eq!(catalog.directory(Path::new("upcoming/1")).unwrap().files.len(), 2);
        assert_eq!(catalog.directories()[1].path, PathBuf::from("upcoming/3-birds"));
        assert!(catalog.directory(Path::new("shown/5-fish")).is_none());
        assert!(catalog.tags().contains("birds"));
        assert!(catalog.tags().contains("fish"));
    }

    #[test]
    fn test_prune_empty() {
        let backend = MockBackend::with_files(["upcoming/1/a.jpg", "upcoming/3-cats/.DS_Store"]);
        backend.create_dir(Path::new("upcoming/2")).unwrap();
        backend.create_dir(Path::new("upcoming/5-dogs")).unwrap();
        let mut sink = Recorder::new();
        assert_eq!(prune_empty(&backend, &mut sink).unwrap(), 2);
        assert!(!backend.exists(Path::new("upcoming/2")).unwrap());
        assert!(!backend.exists(Path::new("upcoming/5-dogs")).unwrap());
        // Hidden files keep a directory alive.
        assert!(backend.exists(Path::new("upcoming/3-cats")).unwrap());
        assert_eq!(sink.count(|d| matches!(d, Diagnostic::PrunedEmpty { .. })), 2);
    }

    #[test]
    fn test_prune_failure_is_reported() {
        let backend = MockBackend::with_files(["upcoming/1/a.jpg"]);
        backend.create_dir(Path::new("upcoming/2")).unwrap();
        backend.fail(shuffler_storage::backend::Op::RemoveDir, "upcoming/2");
        let mut sink = Recorder::new();
        assert_eq!(prune_empty(&backend, &mut sink).unwrap(), 0);
        assert_eq!(sink.count(|d| matches!(d, Diagnostic::PruneFailed { .. })), 1);
    }
}
