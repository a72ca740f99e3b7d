//! Directory snapshot scenarios

use super::test_utils::{directory_with_files, set_mtime};
use std::fs;
use treesync::tree::hasher::{compute_entry_digest, Blake3};
use treesync::{DirectorySnapshot, SnapshotError, SnapshotOptions, SymlinkPolicy};

fn snapshot_with(path: &std::path::Path, symlinks: SymlinkPolicy) -> DirectorySnapshot {
    let options = SnapshotOptions {
        symlinks,
        ..SnapshotOptions::default()
    };
    DirectorySnapshot::from_path_with(path, options).unwrap()
}

#[test]
fn test_three_regular_files() {
    let (_temp, root) = directory_with_files("three", &["a", "b", "c"]);

    let first: DirectorySnapshot = DirectorySnapshot::from_path(&root).unwrap();
    assert_eq!(first.entry_count(), 3);

    let second: DirectorySnapshot = DirectorySnapshot::from_path(&root).unwrap();
    assert_eq!(first.snapshot_digest(), second.snapshot_digest());
    assert!(!first.differs_from(&second));
}

#[test]
fn test_mtime_change_without_content_change() {
    let (_temp, root) = directory_with_files("touched", &["a", "b", "c"]);
    let before: DirectorySnapshot = DirectorySnapshot::from_path(&root).unwrap();

    set_mtime(&root.join("a"), 1_650_000_000);
    let after: DirectorySnapshot = DirectorySnapshot::from_path(&root).unwrap();

    assert!(before.differs_from(&after));
    let changed = before.changed_entries(&after).unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].name, "a");
    assert_eq!(changed[0].path, root.join("a"));
}

#[test]
fn test_entry_digest_uses_name_location_and_mtime() {
    let (_temp, root) = directory_with_files("layout", &["file"]);
    let snapshot: DirectorySnapshot = DirectorySnapshot::from_path(&root).unwrap();

    let entry = snapshot.entry("file").unwrap();
    let expected = compute_entry_digest::<Blake3>("file", "/", entry.modified);
    assert_eq!(entry.digest, expected);
}

#[test]
fn test_subdirectories_are_deferred() {
    let (_temp, root) = directory_with_files("parent", &["a"]);
    fs::create_dir(root.join("child")).unwrap();
    fs::write(root.join("child").join("inner"), "x").unwrap();

    let mut snapshot: DirectorySnapshot = DirectorySnapshot::new();
    let pending = snapshot.enumerate(&root).unwrap();
    assert_eq!(pending, vec![root.join("child")]);
    assert_eq!(snapshot.entry_count(), 1);

    let child: DirectorySnapshot = DirectorySnapshot::from_path(&pending[0]).unwrap();
    assert_eq!(child.entry_count(), 1);
    assert_eq!(child.path(), "child");
}

#[test]
fn test_missing_directory_is_a_filesystem_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let result: Result<DirectorySnapshot, _> =
        DirectorySnapshot::from_path(temp_dir.path().join("gone"));
    assert!(matches!(result, Err(SnapshotError::Filesystem { .. })));
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_to_outside_file() {
        let (temp, root) = directory_with_files("base", &["a", "b"]);
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, "outside").unwrap();

        let baseline = |policy| snapshot_with(&root, policy).entry_count();
        let before = [
            baseline(SymlinkPolicy::CopyAsLeaf),
            baseline(SymlinkPolicy::Ignore),
            baseline(SymlinkPolicy::Follow),
        ];

        symlink(&outside, root.join("link")).unwrap();

        assert_eq!(
            snapshot_with(&root, SymlinkPolicy::CopyAsLeaf).entry_count(),
            before[0] + 1
        );
        assert_eq!(
            snapshot_with(&root, SymlinkPolicy::Ignore).entry_count(),
            before[1]
        );
        assert_eq!(
            snapshot_with(&root, SymlinkPolicy::Follow).entry_count(),
            before[2] + 1
        );
    }

    #[test]
    fn test_symlink_to_outside_directory() {
        let (temp, root) = directory_with_files("base", &["a", "b"]);
        let outside = temp.path().join("outside_dir");
        fs::create_dir(&outside).unwrap();
        let before = snapshot_with(&root, SymlinkPolicy::Follow).entry_count();

        symlink(&outside, root.join("link")).unwrap();

        let followed = snapshot_with(&root, SymlinkPolicy::Follow);
        assert_eq!(followed.entry_count(), before);
        assert_eq!(followed.subdirectories(), &[root.join("link")]);

        assert_eq!(
            snapshot_with(&root, SymlinkPolicy::CopyAsLeaf).entry_count(),
            before + 1
        );
        assert_eq!(
            snapshot_with(&root, SymlinkPolicy::Ignore).entry_count(),
            before
        );
    }

    #[test]
    fn test_cyclic_symlinks_fail_under_follow() {
        let (_temp, root) = directory_with_files("cycle", &["a"]);
        symlink(root.join("ping"), root.join("pong")).unwrap();
        symlink(root.join("pong"), root.join("ping")).unwrap();

        let options = SnapshotOptions {
            symlinks: SymlinkPolicy::Follow,
            ..SnapshotOptions::default()
        };
        let result: Result<DirectorySnapshot, _> = DirectorySnapshot::from_path_with(&root, options);
        assert!(matches!(
            result,
            Err(SnapshotError::SymlinkDepthExceeded { .. })
        ));

        assert_eq!(snapshot_with(&root, SymlinkPolicy::CopyAsLeaf).entry_count(), 3);
    }
}
