//! Local filesystem storage backend.
//!
//! Files live in a configured directory and are accessed with plain
//! `std::fs` calls. Per-file attributes are stored as extended attributes,
//! which the filesystem carries along with the inode on a same-volume rename.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use exn::ResultExt;
use shuffler_codec::{is_bundle, is_hidden};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Linux only exposes unprivileged extended attributes in the `user.`
/// namespace; macOS takes bare names.
#[cfg(target_os = "linux")]
const ATTR_NAMESPACE: &str = "user.";
#[cfg(not(target_os = "linux"))]
const ATTR_NAMESPACE: &str = "";

/// Local filesystem storage backend.
///
/// All paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use shuffler_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("/path/to/pictures").map_err(|e| format!("{e:?}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    /// Root directory for the library
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the library root directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but isn't a
    /// directory. A missing root is created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory. The root
    /// itself is addressed with an empty path.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(self.root.clone());
        }
        let validated = validate_path(path)?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        // Validate path will also canonicalize it.
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            IoErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            IoErrorKind::DirectoryNotEmpty => ErrorKind::NotEmpty(path.to_path_buf()),
            IoErrorKind::Unsupported => ErrorKind::Unsupported(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    fn attr_name(key: &str) -> String {
        format!("{ATTR_NAMESPACE}{key}")
    }

    /// Walk filter: skip dotfiles, and never descend into bundles.
    fn is_visible(entry: &DirEntry) -> bool {
        // Depth 0 is the directory being listed, which the caller named explicitly.
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name();
        !is_hidden(name) && !(entry.file_type().is_dir() && is_bundle(name))
    }
}

impl StorageBackend for LocalBackend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let abs_path = self.absolute_path(path)?;
        let entries = match fs::read_dir(&abs_path) {
            Ok(entries) => entries,
            // A pool that doesn't exist yet simply has no categories.
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(vec![]),
            Err(e) => exn::bail!(Self::map_io_error(e, path)),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::map_io_error(e, path))?;
            if is_hidden(&entry.file_name()) {
                continue;
            }
            let file_type = entry.file_type().map_err(|e| Self::map_io_error(e, &entry.path()))?;
            if file_type.is_dir() {
                dirs.push(self.relative_path(entry.path())?);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let abs_path = self.absolute_path(path)?;
        if !abs_path.is_dir() {
            return Ok(vec![]);
        }
        let mut files = Vec::new();
        let walker = WalkDir::new(&abs_path).sort_by_file_name().into_iter().filter_entry(Self::is_visible);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // One unreadable subdirectory shouldn't hide the rest of the
                // category; it'll be retried on the next rebuild anyway.
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                },
            };
            // Note: symlinks are not followed, and are silently dropped here.
            if entry.file_type().is_file() {
                files.push(self.relative_path(entry.path())?);
            }
        }
        Ok(files)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(abs_path.try_exists().map_err(|e| Self::map_io_error(e, path))?)
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        let mut entries = fs::read_dir(&abs_path).map_err(|e| Self::map_io_error(e, path))?;
        Ok(entries.next().is_none())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::create_dir_all(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        // `fs::rename` silently replaces files (and empty directories) on
        // Unix. Callers pick collision-free names up front; this is the
        // last line against losing an image to a race.
        if to_path.try_exists().map_err(|e| Self::map_io_error(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        Ok(fs::rename(&from_path, &to_path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound if from_path.symlink_metadata().is_err() => ErrorKind::NotFound(from.to_path_buf()),
            _ => Self::map_io_error(e, to),
        })?)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_dir(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    fn get_attr(&self, path: &Path, key: &str) -> Result<Option<String>> {
        let abs_path = self.absolute_path(path)?;
        let value = xattr::get(&abs_path, Self::attr_name(key)).map_err(|e| Self::map_io_error(e, path))?;
        Ok(value.and_then(|bytes| String::from_utf8(bytes).ok()))
    }

    fn set_attr(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(xattr::set(&abs_path, Self::attr_name(key), value.as_bytes()).map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn touch(root: &Path, path: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"not really an image").unwrap();
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new(temp_dir.path()).is_ok());
        assert!(LocalBackend::new("relative/path").is_err());
        assert!(LocalBackend::new("./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("pictures");
        LocalBackend::new(&root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("upcoming/4-cats/tabby.jpg");
        assert_eq!(backend.absolute_path(Path::new("upcoming/4-cats/tabby.jpg")).unwrap(), expected);
        assert_eq!(backend.absolute_path(Path::new("")).unwrap(), temp_dir.path());
        // Path traversal is prevented
        assert!(backend.absolute_path(Path::new("../etc/passwd")).is_err());
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        let abs = temp_dir.path().join("shown/1/pug.png");
        assert_eq!(backend.relative_path(&abs).unwrap(), Path::new("shown/1/pug.png"));
        assert!(backend.relative_path(Path::new("/other/file.png")).is_err());
    }

    #[test]
    fn test_list_dirs_sorted_and_visible_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        for dir in ["upcoming/4-cats", "upcoming/1", "upcoming/.Trashes", "upcoming/2-dogs"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        touch(temp_dir.path(), "upcoming/stray.jpg");
        let dirs = backend.list_dirs(Path::new("upcoming")).unwrap();
        assert_eq!(dirs, vec![
            PathBuf::from("upcoming/1"),
            PathBuf::from("upcoming/2-dogs"),
            PathBuf::from("upcoming/4-cats"),
        ]);
        assert!(backend.list_dirs(Path::new("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_list_files_recursive_skipping_hidden_and_bundles() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        touch(temp_dir.path(), "upcoming/4-cats/b.jpg");
        touch(temp_dir.path(), "upcoming/4-cats/a.jpg");
        touch(temp_dir.path(), "upcoming/4-cats/nested/deeper/c.png");
        touch(temp_dir.path(), "upcoming/4-cats/.DS_Store");
        touch(temp_dir.path(), "upcoming/4-cats/.cache/d.jpg");
        touch(temp_dir.path(), "upcoming/4-cats/Old.photoslibrary/e.jpg");
        let files = backend.list_files(Path::new("upcoming/4-cats")).unwrap();
        assert_eq!(files, vec![
            PathBuf::from("upcoming/4-cats/a.jpg"),
            PathBuf::from("upcoming/4-cats/b.jpg"),
            PathBuf::from("upcoming/4-cats/nested/deeper/c.png"),
        ]);
        assert!(backend.list_files(Path::new("upcoming/nothing-here")).unwrap().is_empty());
    }

    #[test]
    fn test_is_empty_dir_counts_hidden_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        fs::create_dir_all(temp_dir.path().join("upcoming/empty")).unwrap();
        touch(temp_dir.path(), "upcoming/hidden-only/.DS_Store");
        assert!(backend.is_empty_dir(Path::new("upcoming/empty")).unwrap());
        assert!(!backend.is_empty_dir(Path::new("upcoming/hidden-only")).unwrap());
    }

    #[test]
    fn test_rename_never_clobbers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "b.jpg");
        let err = backend.rename(Path::new("a.jpg"), Path::new("b.jpg")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert!(backend.exists(Path::new("a.jpg")).unwrap());
    }

    #[test]
    fn test_rename_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        touch(temp_dir.path(), "shown/4-cats/a.jpg");
        backend.rename(Path::new("shown"), Path::new("rotating")).unwrap();
        assert!(!backend.exists(Path::new("shown")).unwrap());
        assert!(backend.exists(Path::new("rotating/4-cats/a.jpg")).unwrap());
    }

    #[test]
    fn test_rename_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        let err = backend.rename(Path::new("gone.jpg"), Path::new("here.jpg")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_dir_requires_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        backend.create_dir(Path::new("upcoming/3")).unwrap();
        touch(temp_dir.path(), "upcoming/5/a.jpg");
        backend.remove_dir(Path::new("upcoming/3")).unwrap();
        assert!(!backend.exists(Path::new("upcoming/3")).unwrap());
        assert!(backend.remove_dir(Path::new("upcoming/5")).is_err());
    }

    #[test]
    fn test_attributes_follow_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        touch(temp_dir.path(), "upcoming/1/a.jpg");
        match backend.set_attr(Path::new("upcoming/1/a.jpg"), "scaling", "150") {
            Ok(()) => {},
            // Some CI filesystems (older tmpfs, some overlays) have no user xattrs.
            Err(e) if matches!(&*e, ErrorKind::Unsupported(_)) => return,
            Err(e) => panic!("{e:?}"),
        }
        assert_eq!(backend.get_attr(Path::new("upcoming/1/a.jpg"), "scaling").unwrap().as_deref(), Some("150"));
        assert_eq!(backend.get_attr(Path::new("upcoming/1/a.jpg"), "alignment").unwrap(), None);
        backend.create_dir(Path::new("upcoming/5")).unwrap();
        backend.rename(Path::new("upcoming/1/a.jpg"), Path::new("upcoming/5/a.jpg")).unwrap();
        assert_eq!(backend.get_attr(Path::new("upcoming/5/a.jpg"), "scaling").unwrap().as_deref(), Some("150"));
    }

    #[test]
    fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path()).unwrap();
        assert!(backend.exists(Path::new("../etc/passwd")).is_err());
        assert!(backend.create_dir(Path::new("../../escape")).is_err());
        assert!(backend.rename(Path::new("a"), Path::new("../b")).is_err());
    }
}
