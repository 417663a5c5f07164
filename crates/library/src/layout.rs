//! Where things live under the library root.
//!
//! ```text
//! <root>/
//! ├── upcoming/<category>/…   images still to be shown this cycle
//! ├── shown/<category>/…      images already shown this cycle
//! ├── rotating/               only exists part-way through a flip
//! └── trash/                  images the user threw away
//! ```

use std::path::{Component, Path, PathBuf};

pub const UPCOMING: &str = "upcoming";
pub const SHOWN: &str = "shown";
pub const ROTATING: &str = "rotating";
pub const TRASH: &str = "trash";

/// One of the two halves of the library a file can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Upcoming,
    Shown,
}
impl Pool {
    /// Directory of the pool, relative to the root.
    pub fn dir(self) -> &'static Path {
        Path::new(match self {
            Self::Upcoming => UPCOMING,
            Self::Shown => SHOWN,
        })
    }

    /// The pool a root-relative path is in, from its first component.
    pub fn of(path: &Path) -> Option<Self> {
        match path.components().next() {
            Some(Component::Normal(name)) if name == UPCOMING => Some(Self::Upcoming),
            Some(Component::Normal(name)) if name == SHOWN => Some(Self::Shown),
            _ => None,
        }
    }
}

/// `<pool>/<category>` for a file at `<pool>/<category>/…/<file>`.
///
/// `None` unless the path is in a pool and has at least one component below
/// the category directory.
pub fn category_dir(path: &Path) -> Option<PathBuf> {
    Pool::of(path)?;
    let mut components = path.components();
    let dir: PathBuf = components.by_ref().take(2).collect();
    match components.next() {
        Some(_) if dir.components().count() == 2 => Some(dir),
        _ => None,
    }
}

/// The path with its pool prefix removed: `upcoming/4-cats/a.jpg` becomes
/// `4-cats/a.jpg`. Paths outside a pool come back unchanged.
pub fn pool_relative(path: &Path) -> &Path {
    match Pool::of(path) {
        Some(pool) => path.strip_prefix(pool.dir()).unwrap_or(path),
        None => path,
    }
}
