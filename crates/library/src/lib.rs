//! The rotation store.
//!
//! A library root holds two pools, `upcoming/` and `shown/`, each made of
//! category directories whose names carry a weight and tags. [`Store::next`]
//! draws an image from `upcoming/` (weighted by category, filtered, never a
//! recent repeat) and moves it into `shown/`. When `upcoming/` runs dry the
//! pools are flipped and the cycle starts again.
//!
//! Nothing is persisted besides the tree itself. Problems that don't stop an
//! operation are reported as [`Diagnostic`]s to a caller-supplied
//! [`DiagnosticSink`] instead of being returned.

mod catalog;
mod diagnostics;
pub mod error;
mod key;
pub mod layout;
mod mutate;
mod recent;
mod relocate;
mod rotate;
pub mod select;
mod store;

pub use crate::catalog::{Catalog, Directory, prune_empty};
pub use crate::diagnostics::{Diagnostic, DiagnosticSink, Recorder, Severity, TracingSink};
pub use crate::key::Key;
pub use crate::mutate::Recategorized;
pub use crate::recent::{DEFAULT_CEILING, RecencyGuard};
pub use crate::rotate::{consume, flip};
pub use crate::select::{Filter, Pick};
pub use crate::store::{Store, StoreOptions};
