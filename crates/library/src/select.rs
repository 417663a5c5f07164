//! Weighted random selection over a [`Catalog`].
//!
//! A directory is picked with probability proportional to its weight times
//! its file count, then a file uniformly within it. Equivalently every file
//! is picked with probability proportional to its directory's weight.

use crate::catalog::{Catalog, Directory};
use rand::Rng;
use shuffler_codec::TagSet;
use std::path::Path;

/// Constraints on what may be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Directories weighted below this are skipped.
    pub min_weight: u32,
    /// Directories must carry every one of these.
    pub tags: TagSet,
    /// Whether unrated images get their one-in-three chance.
    pub include_not_shown: bool,
}
impl Default for Filter {
    fn default() -> Self {
        Self { min_weight: 1, tags: TagSet::new(), include_not_shown: true }
    }
}
impl Filter {
    /// Whether a directory takes part in the weighted draw.
    pub fn admits(&self, directory: &Directory) -> bool {
        match directory.weight().get() {
            Some(weight) => {
                weight >= self.min_weight && directory.tags().is_superset(&self.tags) && !directory.files.is_empty()
            },
            None => false,
        }
    }
}

/// A drawn image and the directory it was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick<'a> {
    pub directory: &'a Directory,
    pub file: &'a Path,
}

/// Full selection policy:
///
/// 1. with unrated images included, a one-in-three chance of drawing from the
///    not-shown bucket first,
/// 2. otherwise (or if that bucket is empty) a weighted draw,
/// 3. if nothing was eligible, one more go at the not-shown bucket.
///
/// `None` means nothing in the catalog satisfies the filter.
pub fn select<'a, R: Rng + ?Sized>(catalog: &'a Catalog, filter: &Filter, rng: &mut R) -> Option<Pick<'a>> {
    if filter.include_not_shown
        && rng.gen_ratio(1, 3)
        && let Some(pick) = pick_not_shown(catalog, rng)
    {
        return Some(pick);
    }
    if let Some(pick) = pick_weighted(catalog, filter, rng) {
        return Some(pick);
    }
    match filter.include_not_shown {
        true => pick_not_shown(catalog, rng),
        false => None,
    }
}

/// Uniform draw from the not-shown bucket.
pub fn pick_not_shown<'a, R: Rng + ?Sized>(catalog: &'a Catalog, rng: &mut R) -> Option<Pick<'a>> {
    let directory = catalog.not_shown()?;
    let file = &directory.files[rng.gen_range(0..directory.files.len())];
    Some(Pick { directory, file })
}

/// Weighted draw over every directory the filter admits.
///
/// Draws `r` in `[0, total mass)`, walks the directories in catalog order
/// subtracting each one's mass until `r` lands inside one, then takes file
/// `r / weight` from it.
pub fn pick_weighted<'a, R: Rng + ?Sized>(catalog: &'a Catalog, filter: &Filter, rng: &mut R) -> Option<Pick<'a>> {
    let eligible = || catalog.directories().iter().filter(|d| filter.admits(d));
    let total: u64 = eligible().map(Directory::mass).sum();
    if total == 0 {
        return None;
    }
    let mut remaining = rng.gen_range(0..total);
    for directory in eligible() {
        let mass = directory.mass();
        if remaining < mass {
            // Admitted directories are never not-shown, so the weight is there.
            let weight = u64::from(directory.weight().get()?);
            let index = usize::try_from(remaining / weight).ok()?;
            return directory.files.get(index).map(|file| Pick { directory, file });
        }
        remaining -= mass;
    }
    None
}
