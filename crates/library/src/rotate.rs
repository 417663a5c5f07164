//! Consuming dispensed images and recycling the pools.

use crate::catalog::Directory;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ErrorKind, Result};
use crate::layout::{Pool, ROTATING};
use crate::relocate::{relocate, remove_empty_tree};
use exn::ResultExt;
use shuffler_storage::StorageBackend;
use std::path::{Path, PathBuf};

/// Move a dispensed image into the `shown/` directory for its origin's
/// category, creating that directory if needed.
///
/// Images nested deeper inside a category land directly in the shown
/// category directory. Returns the new root-relative path, or `file`
/// unchanged if the move failed (the failure goes to the sink).
pub fn consume(
    backend: &dyn StorageBackend,
    file: &Path,
    origin: &Directory,
    sink: &mut dyn DiagnosticSink,
) -> PathBuf {
    let dest_dir = Pool::Shown.dir().join(origin.category.encode());
    match relocate(backend, file, &dest_dir, sink) {
        Ok(moved) => moved,
        Err(_) => file.to_path_buf(),
    }
}

/// Recycle `shown/` back into `upcoming/`.
///
/// 1. Empty category directories under `upcoming/` are removed.
/// 2. Every other one is moved into `shown/` wholesale, or merged file by
///    file (with collision-safe names) into a same-named directory there.
/// 3. `shown → rotating`, `upcoming → shown`, `rotating → upcoming`.
///
/// A failed rename in step 3 stops the flip where it is and nothing is put
/// back; the error is reported to the sink and returned as
/// [`ErrorKind::Rotation`]. Failures moving single files in step 2 are
/// reported and skipped. Returns how many files ended up in `upcoming/`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn flip(backend: &dyn StorageBackend, sink: &mut dyn DiagnosticSink) -> Result<usize> {
    for pool in [Pool::Upcoming, Pool::Shown] {
        if let Err(e) = backend.create_dir(pool.dir()) {
            sink.emit(Diagnostic::CreateFailed { dir: pool.dir().to_path_buf(), error: e.to_string() });
            return Err(e).or_raise(|| ErrorKind::Rotation);
        }
    }

    for dir in backend.list_dirs(Pool::Upcoming.dir()).or_raise(|| ErrorKind::Storage)? {
        if matches!(backend.is_empty_dir(&dir), Ok(true)) {
            match backend.remove_dir(&dir) {
                Ok(()) => sink.emit(Diagnostic::PrunedEmpty { dir }),
                Err(e) => sink.emit(Diagnostic::PruneFailed { dir, error: e.to_string() }),
            }
            continue;
        }
        let Some(name) = dir.file_name() else {
            continue;
        };
        let target = Pool::Shown.dir().join(name);
        if !backend.exists(&target).or_raise(|| ErrorKind::Storage)? {
            if let Err(e) = backend.rename(&dir, &target) {
                sink.emit(Diagnostic::MoveFailed { from: dir, to: target, error: e.to_string() });
            }
            continue;
        }
        merge_into(backend, &dir, &target, sink)?;
        remove_empty_tree(backend, &dir);
    }

    let recycled = backend.list_files(Pool::Shown.dir()).or_raise(|| ErrorKind::Storage)?.len();
    let rotating = Path::new(ROTATING);
    for (from, to) in [
        (Pool::Shown.dir(), rotating),
        (Pool::Upcoming.dir(), Pool::Shown.dir()),
        (rotating, Pool::Upcoming.dir()),
    ] {
        if let Err(e) = backend.rename(from, to) {
            sink.emit(Diagnostic::FlipAborted { from: from.to_path_buf(), to: to.to_path_buf(), error: e.to_string() });
            return Err(e).or_raise(|| ErrorKind::Rotation);
        }
    }
    sink.emit(Diagnostic::Flipped { files: recycled });
    Ok(recycled)
}

/// Move every file under `source` to the same relative location under
/// `target`, renaming where something is already there.
fn merge_into(backend: &dyn StorageBackend, source: &Path, target: &Path, sink: &mut dyn DiagnosticSink) -> Result<()> {
    for file in backend.list_files(source).or_raise(|| ErrorKind::Storage)? {
        let Ok(relative) = file.strip_prefix(source) else {
            continue;
        };
        let dest_dir = match relative.parent() {
            Some(parent) => target.join(parent),
            None => target.to_path_buf(),
        };
        // Already reported to the sink; the file simply misses this cycle.
        _ = relocate(backend, &file, &dest_dir, sink);
    }
    Ok(())
}
