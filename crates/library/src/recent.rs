use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Default upper bound on the history: four hours of images at one a minute.
pub const DEFAULT_CEILING: usize = 4 * 60;

/// Bounded first-in-first-out history of recently dispensed images.
///
/// Entries are pool-relative paths (`4-cats/tabby.jpg`), so an image is
/// still recognised after it has moved from `upcoming/` to `shown/`, and
/// after a flip has moved it back again.
#[derive(Debug, Clone)]
pub struct RecencyGuard {
    history: VecDeque<PathBuf>,
    capacity: usize,
    ceiling: usize,
}
impl RecencyGuard {
    /// An empty guard that remembers nothing until [`resize`](Self::resize)
    /// is called with the library size.
    pub fn new(ceiling: usize) -> Self {
        Self { history: VecDeque::new(), capacity: 0, ceiling }
    }

    /// Admit `candidate` if it isn't recent, recording it. Returns `false`
    /// (and records nothing) for a repeat.
    pub fn accept(&mut self, candidate: &Path) -> bool {
        if self.contains(candidate) {
            return false;
        }
        self.history.push_back(candidate.to_path_buf());
        self.evict();
        true
    }

    pub fn contains(&self, candidate: &Path) -> bool {
        self.history.iter().any(|p| p == candidate)
    }

    /// Rewrite the most recent entry; used when consuming an image had to
    /// give it a new name.
    pub fn replace_latest(&mut self, path: &Path) {
        if let Some(latest) = self.history.back_mut() {
            *latest = path.to_path_buf();
        }
    }

    /// Size the window for a library of `total` images: half of them, but
    /// never more than the ceiling.
    pub fn resize(&mut self, total: usize) {
        self.capacity = (total / 2).min(self.ceiling);
        self.evict();
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn evict(&mut self) {
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }
}
impl Default for RecencyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn guard(capacity: usize) -> RecencyGuard {
        let mut guard = RecencyGuard::default();
        guard.resize(capacity * 2);
        guard
    }

    #[test]
    fn test_rejects_repeats() {
        let mut guard = guard(2);
        assert!(guard.accept(Path::new("1/a.jpg")));
        assert!(guard.accept(Path::new("1/b.jpg")));
        assert!(!guard.accept(Path::new("1/a.jpg")));
        assert!(!guard.accept(Path::new("1/b.jpg")));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut guard = guard(2);
        assert!(guard.accept(Path::new("1/a.jpg")));
        assert!(guard.accept(Path::new("1/b.jpg")));
        assert!(guard.accept(Path::new("1/c.jpg")));
        // a.jpg fell out of the window
        assert!(guard.accept(Path::new("1/a.jpg")));
        assert!(guard.contains(Path::new("1/c.jpg")));
        assert!(!guard.contains(Path::new("1/b.jpg")));
    }

    #[test]
    fn test_zero_capacity_accepts_everything() {
        let mut guard = RecencyGuard::default();
        assert!(guard.accept(Path::new("1/a.jpg")));
        assert!(guard.accept(Path::new("1/a.jpg")));
        assert!(guard.is_empty());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(5, 2)]
    #[case(100, 50)]
    #[case(479, 239)]
    #[case(480, 240)]
    #[case(10_000, 240)]
    fn test_resize(#[case] total: usize, #[case] expected: usize) {
        let mut guard = RecencyGuard::default();
        guard.resize(total);
        assert_eq!(guard.capacity(), expected);
    }

    #[test]
    fn test_shrinking_drops_oldest() {
        let mut guard = guard(3);
        for name in ["1/a.jpg", "1/b.jpg", "1/c.jpg"] {
            guard.accept(Path::new(name));
        }
        guard.resize(2);
        assert_eq!(guard.len(), 1);
        assert!(guard.contains(Path::new("1/c.jpg")));
    }

    #[test]
    fn test_replace_latest_and_clear() {
        let mut guard = guard(2);
        guard.accept(Path::new("1/a.jpg"));
        guard.replace_latest(Path::new("1/a-2.jpg"));
        assert!(guard.contains(Path::new("1/a-2.jpg")));
        assert!(!guard.contains(Path::new("1/a.jpg")));
        guard.clear();
        assert!(guard.is_empty());
    }
}
