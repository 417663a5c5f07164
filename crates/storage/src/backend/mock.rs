//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use shuffler_codec::{is_bundle, is_hidden};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Operations that can be made to fail with [`MockBackend::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    CreateDir,
    Rename,
    RemoveDir,
    SetAttr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Dir,
    File,
}

#[derive(Debug, Clone)]
struct Node {
    kind: Kind,
    attrs: BTreeMap<String, String>,
}
impl Node {
    fn dir() -> Self {
        Self { kind: Kind::Dir, attrs: BTreeMap::new() }
    }

    fn file() -> Self {
        Self { kind: Kind::File, attrs: BTreeMap::new() }
    }
}

/// In-memory storage backend for testing.
///
/// The tree is a sorted map of relative paths behind a [`RwLock`], so all
/// trait methods can operate on `&self`. Parent directories are implicit when
/// seeding with [`with_files`](Self::with_files), but otherwise the backend
/// follows the same rules as [`LocalBackend`](super::LocalBackend): renames
/// never clobber, need an existing destination parent, and carry attributes
/// (and descendants) along.
///
/// # Examples
///
/// ```
/// use shuffler_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = MockBackend::with_files(["upcoming/4-cats/tabby.jpg"]);
/// assert!(backend.exists(Path::new("upcoming/4-cats")).unwrap());
/// assert_eq!(backend.list_files(Path::new("upcoming")).unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    root: PathBuf,
    tree: RwLock<BTreeMap<PathBuf, Node>>,
    failures: RwLock<Vec<(Op, PathBuf)>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files (and their parents).
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        let backend = Self {
            root: PathBuf::from("/mock"),
            tree: RwLock::new(BTreeMap::new()),
            failures: RwLock::new(Vec::new()),
        };
        for path in files {
            backend.add_file(path);
        }
        backend
    }

    /// Drop a file into the tree behind the store's back, creating parents.
    ///
    /// Panics on an invalid path.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let Ok(validated) = validate_path(path) else {
            panic!("MockBackend::add_file: invalid path {}", path.display());
        };
        let mut tree = self.write();
        if let Some(parent) = validated.parent() {
            Self::insert_dirs(&mut tree, parent);
        }
        tree.insert(validated, Node::file());
    }

    /// Delete a file (or a whole directory) behind the store's back.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.write().retain(|key, _| !key.starts_with(path));
    }

    /// Make every `op` whose (source) path lies under `prefix` fail with
    /// [`PermissionDenied`](ErrorKind::PermissionDenied).
    pub fn fail(&self, op: Op, prefix: impl Into<PathBuf>) {
        self.failures.write().unwrap_or_else(|e| e.into_inner()).push((op, prefix.into()));
    }

    /// Remove all injected failures.
    pub fn heal(&self) {
        self.failures.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Every path in the tree, directories included, in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<PathBuf, Node>> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<PathBuf, Node>> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, op: Op, path: &Path) -> Result<()> {
        let failures = self.failures.read().unwrap_or_else(|e| e.into_inner());
        if failures.iter().any(|(o, prefix)| *o == op && path.starts_with(prefix)) {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }

    /// Like [`validate_path`], but the empty path addresses the root.
    fn resolve(path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Ok(PathBuf::new());
        }
        validate_path(path)
    }

    fn insert_dirs(tree: &mut BTreeMap<PathBuf, Node>, path: &Path) {
        for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            tree.entry(ancestor.to_path_buf()).or_insert_with(Node::dir);
        }
    }

    fn is_dir(tree: &BTreeMap<PathBuf, Node>, path: &Path) -> bool {
        path.as_os_str().is_empty() || tree.get(path).is_some_and(|n| n.kind == Kind::Dir)
    }

    fn children<'a>(
        tree: &'a BTreeMap<PathBuf, Node>,
        path: &'a Path,
    ) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> {
        tree.iter().filter(move |(key, _)| key.parent() == Some(path))
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        Self::with_files(Vec::<PathBuf>::new())
    }
}

impl StorageBackend for MockBackend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let path = Self::resolve(path)?;
        let tree = self.read();
        Ok(Self::children(&tree, &path)
            .filter(|(key, node)| node.kind == Kind::Dir && !key.file_name().is_some_and(is_hidden))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let path = Self::resolve(path)?;
        let tree = self.read();
        let files = tree
            .iter()
            .filter(|(key, node)| node.kind == Kind::File && key.starts_with(&path) && **key != path)
            .filter(|(key, _)| {
                let Ok(relative) = key.strip_prefix(&path) else {
                    return false;
                };
                let mut components = relative.iter().peekable();
                while let Some(name) = components.next() {
                    let is_last = components.peek().is_none();
                    if is_hidden(name) || (!is_last && is_bundle(name)) {
                        return false;
                    }
                }
                true
            })
            .map(|(key, _)| key.clone())
            .collect();
        Ok(files)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let path = Self::resolve(path)?;
        Ok(path.as_os_str().is_empty() || self.read().contains_key(&path))
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        let path = Self::resolve(path)?;
        let tree = self.read();
        if !Self::is_dir(&tree, &path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        Ok(Self::children(&tree, &path).next().is_none())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(Op::CreateDir, &path)?;
        let mut tree = self.write();
        if let Some(file) = path.ancestors().find(|a| tree.get(*a).is_some_and(|n| n.kind == Kind::File)) {
            exn::bail!(ErrorKind::AlreadyExists(file.to_path_buf()));
        }
        Self::insert_dirs(&mut tree, &path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = validate_path(from)?;
        let to = validate_path(to)?;
        self.check(Op::Rename, &from)?;
        let mut tree = self.write();
        if !tree.contains_key(&from) {
            exn::bail!(ErrorKind::NotFound(from));
        }
        if tree.contains_key(&to) {
            exn::bail!(ErrorKind::AlreadyExists(to));
        }
        if to.starts_with(&from) {
            exn::bail!(ErrorKind::InvalidPath(to));
        }
        let parent = to.parent().unwrap_or(Path::new(""));
        if !Self::is_dir(&tree, parent) {
            exn::bail!(ErrorKind::NotFound(parent.to_path_buf()));
        }
        let moving: Vec<PathBuf> = tree.keys().filter(|key| key.starts_with(&from)).cloned().collect();
        for key in moving {
            if let Some(node) = tree.remove(&key) {
                let suffix = key.strip_prefix(&from).unwrap_or(Path::new(""));
                let target = if suffix.as_os_str().is_empty() { to.clone() } else { to.join(suffix) };
                tree.insert(target, node);
            }
        }
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(Op::RemoveDir, &path)?;
        let mut tree = self.write();
        if !Self::is_dir(&tree, &path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        if Self::children(&tree, &path).next().is_some() {
            exn::bail!(ErrorKind::NotEmpty(path));
        }
        tree.remove(&path);
        Ok(())
    }

    fn get_attr(&self, path: &Path, key: &str) -> Result<Option<String>> {
        let path = validate_path(path)?;
        let tree = self.read();
        let node = tree.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(node.attrs.get(key).cloned())
    }

    fn set_attr(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        let path = validate_path(path)?;
        self.check(Op::SetAttr, &path)?;
        let mut tree = self.write();
        let node = tree.get_mut(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        node.attrs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
