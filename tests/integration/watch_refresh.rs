//! Watched directory refresh behavior

use super::test_utils::{directory_with_files, set_mtime};
use std::fs;
use std::time::{Duration, UNIX_EPOCH};
use treesync::watch::{ChangeSet, WatchedDirectory};
use treesync::{DirectorySnapshot, SnapshotOptions};

#[test]
fn test_refresh_tracks_successive_changes() {
    let (_temp, root) = directory_with_files("tracked", &["one", "two", "three"]);
    let watched: WatchedDirectory = WatchedDirectory::new(&root, SnapshotOptions::default()).unwrap();
    let initial = watched.current();

    set_mtime(&root.join("two"), 1_700_000_000);
    let changes = watched.refresh().unwrap();
    assert_eq!(changes.modified, vec![root.join("two")]);

    // Readers holding the old snapshot keep it
    assert_eq!(
        initial.entry("two").unwrap().modified,
        UNIX_EPOCH + Duration::from_secs(1_600_000_001)
    );
    assert_ne!(watched.current().snapshot_digest(), initial.snapshot_digest());

    let changes = watched.refresh().unwrap();
    assert!(changes.is_empty());
    assert!(!changes.digest_changed);
}

#[test]
fn test_change_set_between_unrelated_directories() {
    let (_temp_a, left) = directory_with_files("same", &["x", "y"]);
    let (_temp_b, right) = directory_with_files("same", &["x", "y"]);
    fs::write(right.join("z"), "z").unwrap();

    let left: DirectorySnapshot = DirectorySnapshot::from_path(&left).unwrap();
    let right: DirectorySnapshot = DirectorySnapshot::from_path(&right).unwrap();

    let changes = ChangeSet::between(&left, &right);
    assert!(changes.digest_changed);
    assert_eq!(changes.added.len(), 1);
    assert!(changes.added[0].ends_with("z"));
    assert!(changes.modified.is_empty());
    assert!(changes.removed.is_empty());
}

#[test]
fn test_change_set_ignores_entries_shifted_by_replacement() {
    let (_temp_a, left) = directory_with_files("same", &["a", "b", "c"]);
    let (_temp_b, right) = directory_with_files("same", &["b", "c", "d"]);
    for (dir, names) in [(&left, ["a", "b", "c"]), (&right, ["b", "c", "d"])] {
        for name in names {
            set_mtime(&dir.join(name), 1_600_000_000);
        }
    }

    let left: DirectorySnapshot = DirectorySnapshot::from_path(&left).unwrap();
    let right_snapshot: DirectorySnapshot = DirectorySnapshot::from_path(&right).unwrap();

    let changes = ChangeSet::between(&left, &right_snapshot);
    assert!(changes.digest_changed);
    assert!(changes.modified.is_empty(), "unchanged entries reported: {:?}", changes.modified);
    assert_eq!(changes.added, vec![right.join("d")]);
    assert_eq!(changes.removed.len(), 1);
    assert!(changes.removed[0].ends_with("a"));
}
