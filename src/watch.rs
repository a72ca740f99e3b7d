//! Watched directories
//!
//! A [`WatchedDirectory`] keeps the latest snapshot of one directory behind a
//! single-writer lock. Re-enumeration happens outside the lock; the fresh
//! snapshot is diffed against the current one and then swapped in, so readers
//! always see a complete snapshot.

use crate::error::{ApiError, SnapshotError};
use crate::snapshot::{DirectorySnapshot, SnapshotOptions};
use crate::tree::hasher::{Blake3, DigestAlgorithm};
use notify::{Event, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

fn default_debounce_ms() -> u64 {
    200
}

/// Watch mode configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after the last filesystem event before re-enumerating
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Entries that changed between two snapshots of the same directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Whether the snapshot digests differ
    pub digest_changed: bool,
    pub modified: Vec<PathBuf>,
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    /// Compute what changed from `previous` to `current`
    ///
    /// When both snapshots hold the same number of entries the trees are
    /// diffed in both directions; otherwise the name-keyed entry stores are
    /// compared directly.
    pub fn between<A: DigestAlgorithm>(
        previous: &DirectorySnapshot<A>,
        current: &DirectorySnapshot<A>,
    ) -> Self {
        let mut changes = ChangeSet {
            digest_changed: previous.differs_from(current),
            ..ChangeSet::default()
        };
        if !changes.digest_changed {
            return changes;
        }

        let mut fresh = Vec::new();
        let mut stale = Vec::new();
        let aligned = previous
            .changed_entry_digests(&mut fresh, current)
            .and_then(|_| current.changed_entry_digests(&mut stale, previous));

        match aligned {
            Ok(_) => {
                // A leaf position diverges whenever an insertion or removal
                // shifts later names, so each candidate is checked by name.
                for entry in fresh.iter().filter_map(|d| current.entry_by_digest(d)) {
                    match previous.entry(&entry.file_name) {
                        None => changes.added.push(entry.path.clone()),
                        Some(old) if old.digest != entry.digest => {
                            changes.modified.push(entry.path.clone())
                        }
                        Some(_) => {}
                    }
                }
                for entry in stale.iter().filter_map(|d| previous.entry_by_digest(d)) {
                    if current.entry(&entry.file_name).is_none() {
                        changes.removed.push(entry.path.clone());
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "Entry counts differ, comparing entries by name");
                for entry in current.entries() {
                    match previous.entry(&entry.file_name) {
                        None => changes.added.push(entry.path.clone()),
                        Some(old) if old.digest != entry.digest => {
                            changes.modified.push(entry.path.clone())
                        }
                        Some(_) => {}
                    }
                }
                for entry in previous.entries() {
                    if current.entry(&entry.file_name).is_none() {
                        changes.removed.push(entry.path.clone());
                    }
                }
            }
        }

        changes
    }

    /// True when no entry changed
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

/// A directory whose latest snapshot is kept up to date
pub struct WatchedDirectory<A: DigestAlgorithm = Blake3> {
    root: PathBuf,
    options: SnapshotOptions,
    current: RwLock<Arc<DirectorySnapshot<A>>>,
    writer: Mutex<()>,
}

impl<A: DigestAlgorithm> WatchedDirectory<A> {
    /// Take the initial snapshot of `root`
    pub fn new(root: impl Into<PathBuf>, options: SnapshotOptions) -> Result<Self, SnapshotError> {
        let root = root.into();
        let snapshot = DirectorySnapshot::from_path_with(&root, options)?;
        Ok(Self {
            root,
            options,
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The latest complete snapshot
    pub fn current(&self) -> Arc<DirectorySnapshot<A>> {
        self.current.read().clone()
    }

    /// Re-enumerate the directory and swap the fresh snapshot in
    ///
    /// On error the current snapshot stays in place.
    pub fn refresh(&self) -> Result<ChangeSet, SnapshotError> {
        let _writer = self.writer.lock();

        let fresh = DirectorySnapshot::from_path_with(&self.root, self.options)?;
        let previous = self.current();
        let changes = ChangeSet::between(&previous, &fresh);

        *self.current.write() = Arc::new(fresh);

        if !changes.is_empty() {
            info!(
                root = %self.root.display(),
                modified = changes.modified.len(),
                added = changes.added.len(),
                removed = changes.removed.len(),
                "Directory changed"
            );
        }
        Ok(changes)
    }
}

/// Watch `dir` and call `handler` with every non-empty change set
///
/// Filesystem events for the directory's direct children are debounced; once
/// `debounce_ms` passes without a new event the directory is refreshed.
/// Blocks until `handler` returns `false` or the event channel closes.
pub fn watch<A, F>(dir: &WatchedDirectory<A>, config: &WatchConfig, mut handler: F) -> Result<(), ApiError>
where
    A: DigestAlgorithm,
    F: FnMut(&ChangeSet) -> bool,
{
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(dir.root(), RecursiveMode::NonRecursive)?;

    info!(
        root = %dir.root().display(),
        debounce_ms = config.debounce_ms,
        "Watching directory"
    );

    let debounce = Duration::from_millis(config.debounce_ms);
    while let Ok(event) = rx.recv() {
        log_event(event);
        loop {
            match rx.recv_timeout(debounce) {
                Ok(event) => log_event(event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        let changes = dir.refresh()?;
        if !changes.is_empty() && !handler(&changes) {
            break;
        }
    }

    Ok(())
}

fn log_event(event: notify::Result<Event>) {
    match event {
        Ok(event) => trace!(kind = ?event.kind, paths = ?event.paths, "Filesystem event"),
        Err(e) => warn!("Watch error: {}", e),
    }
}
