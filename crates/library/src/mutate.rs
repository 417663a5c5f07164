//! Re-rating and re-tagging images.
//!
//! A directory is never renamed to change its category. The file moves out
//! instead, into the directory whose name encodes the new category, in the
//! same pool it was already in.

use crate::catalog::decode_dir;
use crate::diagnostics::DiagnosticSink;
use crate::error::{ErrorKind, Result};
use crate::key::Key;
use crate::layout::{self, Pool};
use crate::relocate::relocate;
use exn::{OptionExt, ResultExt};
use shuffler_codec::Category;
use shuffler_storage::StorageBackend;
use std::path::PathBuf;

/// Outcome of a category change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recategorized {
    /// The file moved; this is its new root-relative path.
    Moved(PathBuf),
    /// The category was already what was asked for; nothing moved.
    Unchanged,
}

/// Current category of the file a key points at.
pub(crate) fn current_category(key: &Key) -> Result<Category> {
    let dir = layout::category_dir(key.path()).ok_or_raise(|| ErrorKind::NotCategorized(key.path().to_path_buf()))?;
    decode_dir(&dir).ok_or_raise(|| ErrorKind::NotCategorized(key.path().to_path_buf()))
}

/// Apply `change` to the file's category and move it to match.
///
/// On success the key is updated in place. If the move fails the file stays
/// in its previous category, the key is left alone, and the failure is both
/// reported to the sink and returned.
pub(crate) fn recategorize(
    backend: &dyn StorageBackend,
    key: &mut Key,
    change: impl FnOnce(&Category) -> Category,
    sink: &mut dyn DiagnosticSink,
) -> Result<Recategorized> {
    let pool = Pool::of(key.path()).ok_or_raise(|| ErrorKind::NotCategorized(key.path().to_path_buf()))?;
    let current = current_category(key)?;
    let target = change(&current);
    if target == current {
        return Ok(Recategorized::Unchanged);
    }
    if !backend.exists(key.path()).or_raise(|| ErrorKind::Storage)? {
        exn::bail!(ErrorKind::MissingFile(key.path().to_path_buf()));
    }
    let dest_dir = pool.dir().join(target.encode());
    let moved = relocate(backend, key.path(), &dest_dir, sink)?;
    tracing::info!(from = %key, to = %moved.display(), category = %target, "Recategorized image");
    key.update(moved.clone());
    Ok(Recategorized::Moved(moved))
}
