//! Diagnostics sink abstraction.
//!
//! The store recovers from nearly everything that can go wrong on a live,
//! user-edited directory tree: malformed names, files that vanished, moves
//! that failed. Each of those is reported as a [`Diagnostic`] through a
//! [`DiagnosticSink`] handed to the operation, rather than through a global
//! logger or an application reference, so embedding code decides how (and
//! whether) to surface them.

use derive_more::Display;
use std::path::PathBuf;

/// How loudly a [`Diagnostic`] should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Severity {
    #[display("info")]
    Info,
    #[display("warn")]
    Warn,
    #[display("error")]
    Error,
}

/// Something the store noticed (and dealt with) while doing its job.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Diagnostic {
    /// A directory under `upcoming/` whose name doesn't decode. Skipped, not
    /// deleted.
    #[display("{} isn't formatted correctly", dir.display())]
    MalformedCategory { dir: PathBuf },

    /// A file that isn't a supported image type. Left alone, never shown.
    #[display("can't show {}", path.display())]
    Unshowable { path: PathBuf },

    /// Listing one category directory failed; its files are left out until
    /// the next rebuild.
    #[display("couldn't scan {}: {error}", dir.display())]
    ScanFailed { dir: PathBuf, error: String },

    /// The catalog was rebuilt from disk.
    #[display("loaded {files} images from {directories} directories")]
    Reloaded { directories: usize, files: usize },

    /// An empty category directory was removed.
    #[display("removed empty {}", dir.display())]
    PrunedEmpty { dir: PathBuf },

    /// An empty category directory couldn't be removed.
    #[display("couldn't remove {}: {error}", dir.display())]
    PruneFailed { dir: PathBuf, error: String },

    /// A selected file had disappeared; the catalog is being rebuilt.
    #[display("reloading because {} no longer exists", path.display())]
    MissingFile { path: PathBuf },

    /// No directory matched the selection filter.
    #[display("no images with min weight {min_weight} and tags [{tags}]")]
    NothingEligible { min_weight: u32, tags: String },

    /// Selection gave up; recent history was forgotten so the next request
    /// has a better chance.
    #[display("failed to find an image in {attempts} tries")]
    AttemptsExhausted { attempts: usize },

    /// Moving a dispensed image into `shown/` failed; it stays where it was.
    #[display("couldn't move {} to {}: {error}", from.display(), to.display())]
    MoveFailed { from: PathBuf, to: PathBuf, error: String },

    /// Creating a destination directory failed.
    #[display("couldn't create {}: {error}", dir.display())]
    CreateFailed { dir: PathBuf, error: String },

    /// `upcoming/` ran dry and the pools were swapped.
    #[display("recycled {files} shown images back into upcoming")]
    Flipped { files: usize },

    /// One of the renames of a flip failed; the flip stopped there and the
    /// tree is left as it is.
    #[display("rotation aborted renaming {} to {}: {error}", from.display(), to.display())]
    FlipAborted { from: PathBuf, to: PathBuf, error: String },
}
impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Reloaded { .. } | Self::PrunedEmpty { .. } | Self::Flipped { .. } | Self::MissingFile { .. } => {
                Severity::Info
            },
            Self::MalformedCategory { .. } | Self::Unshowable { .. } | Self::NothingEligible { .. } => Severity::Warn,
            Self::ScanFailed { .. }
            | Self::PruneFailed { .. }
            | Self::AttemptsExhausted { .. }
            | Self::MoveFailed { .. }
            | Self::CreateFailed { .. }
            | Self::FlipAborted { .. } => Severity::Error,
        }
    }
}

/// Receives diagnostics from store operations.
///
/// # Example
///
/// ```
/// use shuffler_library::{Diagnostic, DiagnosticSink, Severity};
///
/// #[derive(Default)]
/// struct ErrorCounter(usize);
///
/// impl DiagnosticSink for ErrorCounter {
///     fn emit(&mut self, diagnostic: Diagnostic) {
///         if diagnostic.severity() == Severity::Error {
///             self.0 += 1;
///         }
///     }
/// }
///
/// let mut sink = ErrorCounter::default();
/// sink.emit(Diagnostic::AttemptsExhausted { attempts: 20 });
/// assert_eq!(sink.0, 1);
/// ```
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing` at its severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;
impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => tracing::info!(target: "shuffler", "{diagnostic}"),
            Severity::Warn => tracing::warn!(target: "shuffler", "{diagnostic}"),
            Severity::Error => tracing::error!(target: "shuffler", "{diagnostic}"),
        }
    }
}

/// Collects diagnostics for later inspection.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub diagnostics: Vec<Diagnostic>,
}
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded diagnostics matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics.iter().filter(|d| predicate(d)).count()
    }

    /// Worst severity seen so far.
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}
impl DiagnosticSink for Recorder {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
