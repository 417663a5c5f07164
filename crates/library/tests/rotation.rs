//! End-to-end rotation against a real directory tree.

use shuffler_codec::{Scaling, Weight};
use shuffler_library::{Diagnostic, Filter, Recategorized, Recorder, Store, StoreOptions};
use shuffler_storage::StorageBackend;
use shuffler_storage::backend::LocalBackend;
use shuffler_storage::error::ErrorKind as StorageErrorKind;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

// === helpers ===

fn library(files: &[&str]) -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not really an image").unwrap();
    }
    let backend = LocalBackend::new(dir.path()).unwrap();
    let mut store = Store::with_seed(Arc::new(backend), StoreOptions::default(), 7);
    store.post_init(&mut Recorder::new()).unwrap();
    (dir, store)
}

fn files_under(root: &Path, pool: &str) -> Vec<PathBuf> {
    WalkDir::new(root.join(pool))
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

fn rated() -> Filter {
    Filter { include_not_shown: false, ..Filter::default() }
}

// === tests ===

#[test]
fn dispensing_never_repeats_within_the_window() {
    let (_dir, mut store) =
        library(&["upcoming/1/a.jpg", "upcoming/1/b.jpg", "upcoming/2/c.png", "upcoming/2/d.png", "upcoming/3/e.gif"]);
    assert_eq!(store.recents().capacity(), 2);
    let mut names = Vec::new();
    for _ in 0..25 {
        let key = store.next(&rated(), &mut Recorder::new()).unwrap().unwrap();
        let name = key.pool_relative().to_path_buf();
        assert!(!names.iter().rev().take(2).any(|n| n == &name), "{name:?} came back too soon");
        names.push(name);
    }
}

#[test]
fn flipping_recycles_every_shown_image() {
    let (dir, mut store) = library(&[
        "upcoming/4-cats/a.jpg",
        "shown/4-cats/a.jpg",
        "shown/2-dogs/b.jpg",
        "shown/2-dogs/deep/c.jpg",
    ]);
    let mut sink = Recorder::new();
    store.flip(&mut sink).unwrap();

    assert_eq!(files_under(dir.path(), "upcoming"), vec![
        PathBuf::from("upcoming/2-dogs/b.jpg"),
        PathBuf::from("upcoming/2-dogs/deep/c.jpg"),
        PathBuf::from("upcoming/4-cats/a-2.jpg"),
        PathBuf::from("upcoming/4-cats/a.jpg"),
    ]);
    assert!(files_under(dir.path(), "shown").is_empty());
    assert!(!dir.path().join("rotating").exists());
    assert_eq!(store.catalog().total_files(), 4);
    assert!(sink.diagnostics.contains(&Diagnostic::Flipped { files: 4 }));
}

#[test]
fn exhaustion_flips_exactly_once() {
    let (dir, mut store) = library(&["upcoming/1/a.jpg", "upcoming/1/b.jpg"]);
    let mut sink = Recorder::new();
    for _ in 0..2 {
        store.next(&rated(), &mut sink).unwrap().unwrap();
    }
    assert!(files_under(dir.path(), "upcoming").is_empty());
    assert_eq!(sink.count(|d| matches!(d, Diagnostic::Flipped { .. })), 0);

    let key = store.next(&rated(), &mut sink).unwrap().unwrap();
    assert!(dir.path().join(key.path()).is_file());
    assert_eq!(sink.count(|d| matches!(d, Diagnostic::Flipped { .. })), 1);
    assert_eq!(files_under(dir.path(), "upcoming").len(), 1);
}

#[test]
fn nothing_eligible_after_a_flip() {
    let (_dir, mut store) = library(&["upcoming/1-cats/a.jpg", "shown/2-cats/b.jpg"]);
    let mut sink = Recorder::new();
    let filter = Filter { tags: ["dogs"].as_slice().try_into().unwrap(), ..rated() };
    assert!(store.next(&filter, &mut sink).unwrap().is_none());
    assert_eq!(sink.count(|d| matches!(d, Diagnostic::Flipped { .. })), 1);
    assert_eq!(sink.count(|d| matches!(d, Diagnostic::NothingEligible { .. })), 1);
}

#[test]
fn rerating_keeps_display_attributes() {
    let (dir, mut store) = library(&["upcoming/not-shown/a.jpg"]);
    let backend = LocalBackend::new(dir.path()).unwrap();
    match backend.set_attr(Path::new("upcoming/not-shown/a.jpg"), "check", "1") {
        Ok(()) => {},
        // Extended attributes aren't available on every filesystem.
        Err(e) if matches!(&*e, StorageErrorKind::Unsupported(_)) => return,
        Err(e) => panic!("{e:?}"),
    }
    let mut key = store.key(dir.path().join("upcoming/not-shown/a.jpg")).unwrap();
    store.set_scaling(&key, Scaling::Percent(150)).unwrap();

    let outcome = store.set_weight(&mut key, Weight::weighted(3).unwrap(), &mut Recorder::new()).unwrap();
    assert_eq!(outcome, Recategorized::Moved(PathBuf::from("upcoming/3/a.jpg")));
    assert_eq!(store.scaling(&key).unwrap(), Scaling::Percent(150));

    store.flip(&mut Recorder::new()).unwrap();
    store.flip(&mut Recorder::new()).unwrap();
    assert_eq!(store.scaling(&key).unwrap(), Scaling::Percent(150));
}

#[test]
fn colliding_names_never_overwrite() {
    let (dir, mut store) = library(&["upcoming/1/cat.jpg", "upcoming/2/cat.jpg", "upcoming/3/cat.jpg"]);
    let mut sink = Recorder::new();
    for from in ["upcoming/1/cat.jpg", "upcoming/2/cat.jpg", "upcoming/3/cat.jpg"] {
        let mut key = store.key(from).unwrap();
        store.set_weight(&mut key, Weight::weighted(5).unwrap(), &mut sink).unwrap();
        store.add_tag(&mut key, "pets", &mut sink).unwrap();
    }
    assert_eq!(files_under(dir.path(), "upcoming"), vec![
        PathBuf::from("upcoming/5-pets/cat-2.jpg"),
        PathBuf::from("upcoming/5-pets/cat-3.jpg"),
        PathBuf::from("upcoming/5-pets/cat.jpg"),
    ]);
    assert!(sink.diagnostics.is_empty());
}

#[test]
fn trash_and_prune() {
    let (dir, mut store) = library(&["upcoming/1/a.jpg", "upcoming/2/b.jpg"]);
    let key = store.key("upcoming/1/a.jpg").unwrap();
    let trashed = store.trash(&key, &mut Recorder::new()).unwrap();
    assert_eq!(trashed, PathBuf::from("trash/a.jpg"));
    assert!(dir.path().join("trash/a.jpg").is_file());

    let mut sink = Recorder::new();
    store.post_init(&mut sink).unwrap();
    assert!(!dir.path().join("upcoming/1").exists());
    assert_eq!(store.catalog().total_files(), 1);
}
