//! Directory snapshots
//!
//! A snapshot enumerates the direct children of one directory, derives one
//! leaf digest per qualifying entry from its identity metadata, and reduces
//! the leaves into a [`MerkleTree`]. Subdirectories are not expanded; they
//! are handed back to the caller, which snapshots them independently.

use crate::error::SnapshotError;
use crate::tree::hasher::{self, Blake3, DigestAlgorithm};
use crate::tree::path;
use crate::tree::walker::{self, Entry, EntryKind, SymlinkPolicy, Walker, WalkerConfig};
use crate::tree::MerkleTree;
use crate::types::Digest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{debug, error, info, instrument, trace};

/// Order in which leaves are fed to the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafOrder {
    /// Sorted by raw file name
    #[default]
    Name,
    /// The order the filesystem listed the entries in
    Enumeration,
}

/// Snapshot options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    #[serde(default)]
    pub symlinks: SymlinkPolicy,

    #[serde(default)]
    pub leaf_order: LeafOrder,

    /// Maximum number of links resolved for one entry under `follow`
    #[serde(default = "walker::default_max_symlink_depth")]
    pub max_symlink_depth: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            symlinks: SymlinkPolicy::default(),
            leaf_order: LeafOrder::default(),
            max_symlink_depth: walker::default_max_symlink_depth(),
        }
    }
}

impl SnapshotOptions {
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            symlinks: self.symlinks,
            max_symlink_depth: self.max_symlink_depth,
        }
    }
}

/// One qualifying entry of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    /// Raw file name, the key of the entry store
    #[serde(skip)]
    pub file_name: OsString,
    /// Display form of the name (NFC, lossy)
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub modified: SystemTime,
    pub digest: Digest,
}

/// Snapshot of one directory at a point in time
///
/// Entries are stored by their raw file name, so names that only differ in
/// Unicode normalization or in invalid UTF-8 stay distinct entries. The
/// digest map is a secondary index: a digest collision between two entries
/// can only shadow an index slot, never drop an entry.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot<A: DigestAlgorithm = Blake3> {
    path: PathBuf,
    name: String,
    options: SnapshotOptions,
    entries: BTreeMap<OsString, SnapshotEntry>,
    by_digest: HashMap<Digest, OsString>,
    subdirectories: Vec<PathBuf>,
    tree: MerkleTree<A>,
    digest: Digest,
}

impl<A: DigestAlgorithm> DirectorySnapshot<A> {
    /// An empty snapshot with default options
    pub fn new() -> Self {
        Self::with_options(SnapshotOptions::default())
    }

    /// An empty snapshot that will enumerate with `options`
    pub fn with_options(options: SnapshotOptions) -> Self {
        Self {
            path: PathBuf::new(),
            name: String::new(),
            options,
            entries: BTreeMap::new(),
            by_digest: HashMap::new(),
            subdirectories: Vec::new(),
            tree: MerkleTree::new(),
            digest: Digest::empty(),
        }
    }

    /// Snapshot `path` with default options
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::from_path_with(path, SnapshotOptions::default())
    }

    /// Snapshot `path` with `options`
    pub fn from_path_with(
        path: impl AsRef<Path>,
        options: SnapshotOptions,
    ) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::with_options(options);
        snapshot.enumerate(path)?;
        Ok(snapshot)
    }

    /// Enumerate `path` and replace this snapshot's state with the result
    ///
    /// Returns the subdirectories found, which are not expanded. On error the
    /// previous state is kept untouched.
    #[instrument(skip(self, path), fields(dir = %path.as_ref().display()))]
    pub fn enumerate(&mut self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>, SnapshotError> {
        let start = Instant::now();
        let root = path.as_ref().to_path_buf();

        let walker = Walker::with_config(root.clone(), self.options.walker_config());
        let walked = walker.walk().map_err(|e| {
            error!("Directory enumeration failed: {}", e);
            e
        })?;

        let mut entries = BTreeMap::new();
        let mut enumeration_order = Vec::new();
        let mut subdirectories = Vec::new();

        for entry in walked {
            match entry {
                Entry::Leaf {
                    file_name,
                    name,
                    path: entry_path,
                    modified,
                    kind,
                } => {
                    let relative = path::relative_parent(&root, &entry_path);
                    let digest = hasher::compute_entry_digest::<A>(
                        path::name_bytes(&file_name),
                        &relative,
                        modified,
                    );
                    trace!(entry = %name, digest = %digest, "Hashed entry");

                    let record = SnapshotEntry {
                        file_name: file_name.clone(),
                        name,
                        path: entry_path,
                        kind,
                        modified,
                        digest,
                    };
                    // One directory listing never yields the same raw name twice
                    if entries.insert(file_name.clone(), record).is_none() {
                        enumeration_order.push(file_name);
                    }
                }
                Entry::Directory { path } => subdirectories.push(path),
            }
        }

        let leaves: Vec<Digest> = match self.options.leaf_order {
            LeafOrder::Name => entries.values().map(|e| e.digest).collect(),
            LeafOrder::Enumeration => enumeration_order
                .iter()
                .filter_map(|name| entries.get(name))
                .map(|e| e.digest)
                .collect(),
        };

        let mut by_digest = HashMap::with_capacity(entries.len());
        for entry in entries.values() {
            if let Some(previous) = by_digest.insert(entry.digest, entry.file_name.clone()) {
                debug!(
                    digest = %entry.digest,
                    shadowed = %previous.to_string_lossy(),
                    entry = %entry.name,
                    "Digest collision between entries"
                );
            }
        }

        let name = directory_name(&root)?;
        let tree = MerkleTree::from_leaves(leaves);
        let digest = hasher::compute_snapshot_digest::<A>(&tree.top(), &name);

        self.path = root;
        self.name = name;
        self.entries = entries;
        self.by_digest = by_digest;
        self.subdirectories = subdirectories;
        self.tree = tree;
        self.digest = digest;

        info!(
            entry_count = self.entries.len(),
            subdirectory_count = self.subdirectories.len(),
            digest = %self.digest,
            duration_ms = start.elapsed().as_millis(),
            "Snapshot completed"
        );

        Ok(self.subdirectories.clone())
    }

    pub fn top_hash_tree(&self) -> &MerkleTree<A> {
        &self.tree
    }

    /// hash(top.hex || directory name)
    pub fn snapshot_digest(&self) -> Digest {
        self.digest
    }

    /// Final component of the snapshot path, after resolving `.` and `..`
    pub fn path(&self) -> String {
        self.name.clone()
    }

    /// The snapshot path as it was supplied to [`DirectorySnapshot::enumerate`]
    pub fn absolute_path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries ordered by name
    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.values()
    }

    /// Look an entry up by its raw file name
    pub fn entry(&self, file_name: impl AsRef<OsStr>) -> Option<&SnapshotEntry> {
        self.entries.get(file_name.as_ref())
    }

    pub fn entry_by_digest(&self, digest: &Digest) -> Option<&SnapshotEntry> {
        self.by_digest
            .get(digest)
            .and_then(|name| self.entries.get(name))
    }

    /// Subdirectories found by the last enumeration
    pub fn subdirectories(&self) -> &[PathBuf] {
        &self.subdirectories
    }

    /// Whether the snapshot digests differ
    pub fn differs_from(&self, other: &Self) -> bool {
        self.digest != other.digest
    }

    /// Append the digests of `other` at every leaf position where the two
    /// snapshots disagree
    ///
    /// Valid only when both snapshots enumerate the same number of entries in
    /// corresponding order; otherwise this fails with a structural mismatch.
    pub fn changed_entry_digests(
        &self,
        out: &mut Vec<Digest>,
        other: &Self,
    ) -> Result<bool, SnapshotError> {
        Ok(self.tree.collect_changed_leaves(out, &other.tree)?)
    }

    /// The entries of `other` that differ from this snapshot
    pub fn changed_entries<'a>(&self, other: &'a Self) -> Result<Vec<&'a SnapshotEntry>, SnapshotError> {
        let mut changed = Vec::new();
        self.changed_entry_digests(&mut changed, other)?;
        Ok(changed
            .iter()
            .filter_map(|digest| other.entry_by_digest(digest))
            .collect())
    }

    /// Change the symlink policy used by the next enumeration
    pub fn set_symlink_policy(&mut self, policy: SymlinkPolicy) {
        self.options.symlinks = policy;
    }

    pub fn symlink_policy(&self) -> SymlinkPolicy {
        self.options.symlinks
    }

    pub fn options(&self) -> &SnapshotOptions {
        &self.options
    }
}

impl<A: DigestAlgorithm> Default for DirectorySnapshot<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// The name hashed into the snapshot digest
///
/// Paths ending in `.` or `..` have no final component of their own; they
/// are canonicalized first so `.` and its absolute spelling agree. The
/// filesystem root keeps its canonical rendering.
fn directory_name(path: &Path) -> Result<String, SnapshotError> {
    if let Some(name) = path.file_name() {
        return Ok(path::normalize_name(name));
    }

    let canonical = path::canonicalize_path(path)?;
    Ok(match canonical.file_name() {
        Some(name) => path::normalize_name(name),
        None => canonical.to_string_lossy().into_owned(),
    })
}
