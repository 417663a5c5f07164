//! The rotation store.

use crate::catalog::{self, Catalog};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ErrorKind, Result};
use crate::key::Key;
use crate::layout::{self, Pool, TRASH};
use crate::mutate::{self, Recategorized};
use crate::recent::{DEFAULT_CEILING, RecencyGuard};
use crate::relocate::relocate;
use crate::rotate;
use crate::select::{self, Filter};
use exn::ResultExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use shuffler_codec::{ALIGNMENT_KEY, Alignment, Category, SCALING_KEY, Scaling, Tag, TagSet, Weight};
use shuffler_storage::error::ErrorKind as StorageErrorKind;
use shuffler_storage::{BackendHandle, validate_path};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Tunables that don't change between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Selection attempts per [`Store::next`] before giving up.
    pub max_attempts: usize,
    /// Upper bound on the recent-history window.
    pub recents_ceiling: usize,
    /// Remove empty category directories during [`Store::post_init`].
    pub prune_on_start: bool,
}
impl Default for StoreOptions {
    fn default() -> Self {
        Self { max_attempts: 20, recents_ceiling: DEFAULT_CEILING, prune_on_start: true }
    }
}

/// Weighted, repeat-avoiding image rotation over a categorized directory
/// tree.
///
/// The store owns the catalog snapshot and the recent history; everything
/// else lives on disk. Calls must be serialized by the caller.
///
/// ```no_run
/// use shuffler_library::{Filter, Store, StoreOptions, TracingSink};
/// use shuffler_storage::backend::LocalBackend;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("/home/me/Pictures/Shuffler").map_err(|e| format!("{e:?}"))?;
/// let mut store = Store::new(Arc::new(backend), StoreOptions::default());
/// let mut sink = TracingSink;
/// store.post_init(&mut sink).map_err(|e| format!("{e:?}"))?;
/// if let Some(key) = store.next(&Filter::default(), &mut sink).map_err(|e| format!("{e:?}"))? {
///     println!("{}", store.absolute(&key).display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Store {
    backend: BackendHandle,
    options: StoreOptions,
    catalog: Catalog,
    recents: RecencyGuard,
    rng: StdRng,
}

impl Store {
    pub fn new(backend: BackendHandle, options: StoreOptions) -> Self {
        Self::with_rng(backend, options, StdRng::from_entropy())
    }

    /// A store whose draws are reproducible.
    pub fn with_seed(backend: BackendHandle, options: StoreOptions, seed: u64) -> Self {
        Self::with_rng(backend, options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(backend: BackendHandle, options: StoreOptions, rng: StdRng) -> Self {
        Self {
            backend,
            options,
            catalog: Catalog::default(),
            recents: RecencyGuard::new(options.recents_ceiling),
            rng,
        }
    }

    /// Make sure both pools exist, clear out empty category directories
    /// (if enabled) and build the catalog. Call once before anything else.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %self.backend.root().display()))]
    pub fn post_init(&mut self, sink: &mut dyn DiagnosticSink) -> Result<()> {
        for pool in [Pool::Upcoming, Pool::Shown] {
            self.backend.create_dir(pool.dir()).or_raise(|| ErrorKind::Storage)?;
        }
        if self.options.prune_on_start {
            catalog::prune_empty(&*self.backend, sink)?;
        }
        self.rebuild(sink)
    }

    /// Rescan the library from disk and resize the recent-history window.
    /// Tags seen earlier in the session stay available even if no directory
    /// carries them any more.
    pub fn rebuild(&mut self, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let mut catalog = Catalog::build(&*self.backend, sink)?;
        catalog.absorb_tags(self.catalog.tags());
        self.catalog = catalog;
        self.recents.resize(self.catalog.total_files());
        Ok(())
    }

    /// Recycle `shown/` back into `upcoming/` and rebuild.
    ///
    /// A flip that stops part-way is reported to the sink and returned as
    /// [`ErrorKind::Rotation`]; the catalog is rebuilt either way so that it
    /// matches whatever state the tree was left in.
    pub fn flip(&mut self, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let flipped = rotate::flip(&*self.backend, sink);
        self.rebuild(sink)?;
        flipped.map(|_| ())
    }

    /// Dispense the next image.
    ///
    /// Draws from the catalog according to `filter`, skipping anything shown
    /// recently, and moves the winner into `shown/`. When nothing in
    /// `upcoming/` is eligible the pools are flipped and selection carries
    /// on, at most once per call. A drawn file that has vanished from disk
    /// triggers a rebuild and another attempt.
    ///
    /// `Ok(None)` means no image is available: either nothing matches the
    /// filter even after a flip, or every attempt hit a recent or missing
    /// file (in which case the recent history is forgotten).
    #[tracing::instrument(level = "debug", skip_all, fields(min_weight = filter.min_weight))]
    pub fn next(&mut self, filter: &Filter, sink: &mut dyn DiagnosticSink) -> Result<Option<Key>> {
        let mut flipped = false;
        for _ in 0..self.options.max_attempts {
            let Some(pick) = select::select(&self.catalog, filter, &mut self.rng) else {
                if flipped {
                    sink.emit(Diagnostic::NothingEligible {
                        min_weight: filter.min_weight,
                        tags: filter.tags.to_string(),
                    });
                    return Ok(None);
                }
                flipped = true;
                match self.flip(sink) {
                    Ok(()) => {},
                    // Already reported; selection carries on against whatever the tree looks like now.
                    Err(e) if matches!(&*e, ErrorKind::Rotation) => {},
                    Err(e) => return Err(e),
                }
                continue;
            };
            let file = pick.file.to_path_buf();
            let origin = pick.directory.clone();

            if !self.backend.exists(&file).or_raise(|| ErrorKind::Storage)? {
                sink.emit(Diagnostic::MissingFile { path: file });
                self.rebuild(sink)?;
                continue;
            }
            if !self.recents.accept(layout::pool_relative(&file)) {
                tracing::trace!(file = %file.display(), "Skipping recently shown image");
                continue;
            }

            let consumed = rotate::consume(&*self.backend, &file, &origin, sink);
            if consumed != file {
                self.catalog.forget(&file);
                self.catalog.admit(&consumed);
                self.recents.replace_latest(layout::pool_relative(&consumed));
            }
            tracing::debug!(file = %consumed.display(), "Dispensed image");
            return Ok(Some(Key::new(consumed)));
        }
        sink.emit(Diagnostic::AttemptsExhausted { attempts: self.options.max_attempts });
        self.recents.clear();
        Ok(None)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn recents(&self) -> &RecencyGuard {
        &self.recents
    }

    /// Key for a file given by path, either absolute (inside the library
    /// root) or relative to the root.
    pub fn key(&self, path: impl AsRef<Path>) -> Result<Key> {
        let path = path.as_ref();
        let relative = match path.is_absolute() {
            true => path
                .strip_prefix(self.backend.root())
                .or_raise(|| ErrorKind::NotCategorized(path.to_path_buf()))?,
            false => path,
        };
        let relative = validate_path(relative).or_raise(|| ErrorKind::NotCategorized(path.to_path_buf()))?;
        if layout::category_dir(&relative).is_none() {
            exn::bail!(ErrorKind::NotCategorized(path.to_path_buf()));
        }
        if !self.backend.exists(&relative).or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::MissingFile(relative));
        }
        Ok(Key::new(relative))
    }

    /// Absolute location of an image (or any root-relative path), for
    /// handing to a viewer.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        self.backend.absolute(path.as_ref())
    }

    /// Display name: the file name without its extension.
    pub fn name(&self, key: &Key) -> String {
        key.name()
    }

    /// Weight of the image's category, or weight 1 if it isn't in one.
    pub fn weight(&self, key: &Key) -> Weight {
        mutate::current_category(key).map(|c| c.weight).unwrap_or_default()
    }

    /// Tags of the image's category (none if it isn't in one).
    pub fn tags(&self, key: &Key) -> TagSet {
        mutate::current_category(key).map(|c| c.tags).unwrap_or_default()
    }

    /// Every tag seen in either pool at the last rebuild, plus any added since.
    pub fn available_tags(&self) -> &TagSet {
        self.catalog.tags()
    }

    /// Re-rate an image. The key follows the file.
    pub fn set_weight(
        &mut self,
        key: &mut Key,
        weight: Weight,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Recategorized> {
        self.recategorize(key, |c| c.with_weight(weight), sink)
    }

    /// Tag an image. Tagging an unrated image also gives it weight 1.
    pub fn add_tag(&mut self, key: &mut Key, tag: &str, sink: &mut dyn DiagnosticSink) -> Result<Recategorized> {
        let tag = Tag::from_str(tag).or_raise(|| ErrorKind::Codec)?;
        self.recategorize(key, |c| c.with_tag(tag), sink)
    }

    pub fn remove_tag(&mut self, key: &mut Key, tag: &str, sink: &mut dyn DiagnosticSink) -> Result<Recategorized> {
        let tag = Tag::from_str(tag).or_raise(|| ErrorKind::Codec)?;
        self.recategorize(key, |c| c.without_tag(&tag), sink)
    }

    fn recategorize(
        &mut self,
        key: &mut Key,
        change: impl FnOnce(&Category) -> Category,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Recategorized> {
        let previous = key.path().to_path_buf();
        let outcome = mutate::recategorize(&*self.backend, key, change, sink)?;
        if let Recategorized::Moved(moved) = &outcome {
            self.catalog.forget(&previous);
            self.catalog.admit(moved);
        }
        Ok(outcome)
    }

    /// Scaling to display the image at. Unset or unreadable values (and
    /// filesystems without extended attributes) give [`Scaling::Natural`].
    pub fn scaling(&self, key: &Key) -> Result<Scaling> {
        Ok(self.attribute(key, SCALING_KEY)?.unwrap_or_default())
    }

    pub fn set_scaling(&self, key: &Key, scaling: Scaling) -> Result<()> {
        self.set_attribute(key, SCALING_KEY, &scaling.to_string())
    }

    /// Alignment inside the display area; [`Alignment::Center`] by default.
    pub fn alignment(&self, key: &Key) -> Result<Alignment> {
        Ok(self.attribute(key, ALIGNMENT_KEY)?.unwrap_or_default())
    }

    pub fn set_alignment(&self, key: &Key, alignment: Alignment) -> Result<()> {
        // Stored as the integer, not the name.
        self.set_attribute(key, ALIGNMENT_KEY, &alignment.to_raw().to_string())
    }

    fn attribute<T: FromStr>(&self, key: &Key, name: &str) -> Result<Option<T>> {
        match self.backend.get_attr(key.path(), name) {
            Ok(value) => Ok(value.and_then(|v| v.parse().ok())),
            Err(e) if matches!(&*e, StorageErrorKind::Unsupported(_)) => Ok(None),
            Err(e) if e.is_not_found() => exn::bail!(ErrorKind::MissingFile(key.path().to_path_buf())),
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }

    fn set_attribute(&self, key: &Key, name: &str, value: &str) -> Result<()> {
        match self.backend.set_attr(key.path(), name, value) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => exn::bail!(ErrorKind::MissingFile(key.path().to_path_buf())),
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }

    /// Move an image into `<root>/trash/` (renamed if something there has
    /// the same name) and drop it from the catalog. Returns where it went.
    pub fn trash(&mut self, key: &Key, sink: &mut dyn DiagnosticSink) -> Result<PathBuf> {
        if !self.backend.exists(key.path()).or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::MissingFile(key.path().to_path_buf()));
        }
        let trashed = relocate(&*self.backend, key.path(), Path::new(TRASH), sink)?;
        self.catalog.forget(key.path());
        tracing::info!(from = %key, to = %trashed.display(), "Trashed image");
        Ok(trashed)
    }
}
