//! Moving files between directories without ever overwriting anything.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use shuffler_storage::StorageBackend;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// A numeric disambiguation suffix left by an earlier collision.
static COLLISION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d+$").unwrap());

/// First free path for `file_name` inside `dir`.
///
/// The name is used as-is if nothing (file or directory) occupies it.
/// Otherwise any `-<digits>` suffix is stripped from the stem and `-2`, `-3`,
/// … tried in turn, so `tabby-2.jpg` colliding again becomes `tabby-3.jpg`
/// rather than `tabby-2-2.jpg`.
pub(crate) fn free_name(backend: &dyn StorageBackend, dir: &Path, file_name: &OsStr) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !backend.exists(&candidate).or_raise(|| ErrorKind::Storage)? {
        return Ok(candidate);
    }
    let original = Path::new(file_name);
    let stem = original.file_stem().unwrap_or(file_name);
    let base: OsString = match stem.to_str() {
        Some(stem) => match COLLISION_SUFFIX.replace(stem, "") {
            // A name that's nothing but a suffix keeps it.
            stripped if stripped.is_empty() => stem.into(),
            stripped => stripped.into_owned().into(),
        },
        None => stem.to_os_string(),
    };
    let mut i = 2usize;
    loop {
        let mut name = base.clone();
        name.push(format!("-{i}"));
        if let Some(ext) = original.extension() {
            name.push(".");
            name.push(ext);
        }
        let candidate = dir.join(name);
        if !backend.exists(&candidate).or_raise(|| ErrorKind::Storage)? {
            return Ok(candidate);
        }
        i += 1;
    }
}

/// Move `file` into `dest_dir` (created if needed) under a collision-safe
/// name and return where it ended up.
///
/// Failures are reported to the sink as well as returned; the file is left
/// where it was.
pub(crate) fn relocate(
    backend: &dyn StorageBackend,
    file: &Path,
    dest_dir: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<PathBuf> {
    let Some(file_name) = file.file_name() else {
        exn::bail!(ErrorKind::NotCategorized(file.to_path_buf()));
    };
    if let Err(e) = backend.create_dir(dest_dir) {
        sink.emit(Diagnostic::CreateFailed { dir: dest_dir.to_path_buf(), error: e.to_string() });
        return Err(e).or_raise(|| ErrorKind::Relocation);
    }
    let destination = free_name(backend, dest_dir, file_name).or_raise(|| ErrorKind::Relocation)?;
    if let Err(e) = backend.rename(file, &destination) {
        sink.emit(Diagnostic::MoveFailed { from: file.to_path_buf(), to: destination, error: e.to_string() });
        return Err(e).or_raise(|| ErrorKind::Relocation);
    }
    tracing::debug!(from = %file.display(), to = %destination.display(), "Moved file");
    Ok(destination)
}

/// Remove `dir` and every directory beneath it that holds nothing at all.
/// Anything still containing entries (hidden ones included) is left alone.
pub(crate) fn remove_empty_tree(backend: &dyn StorageBackend, dir: &Path) {
    match backend.list_dirs(dir) {
        Ok(children) => children.iter().for_each(|child| remove_empty_tree(backend, child)),
        Err(e) => tracing::debug!(dir = %dir.display(), error = ?e, "Couldn't list directory"),
    }
    if matches!(backend.is_empty_dir(dir), Ok(true))
        && let Err(e) = backend.remove_dir(dir)
    {
        tracing::debug!(dir = %dir.display(), error = ?e, "Couldn't remove empty directory");
    }
}
