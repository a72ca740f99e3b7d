//! Single-directory walker: lists the direct children of one directory and
//! classifies them into leaves and deferred subdirectories

use crate::error::SnapshotError;
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;
use tracing::{trace, warn};
use walkdir::{DirEntry, WalkDir};

/// How symbolic links found in a directory are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Resolve the link and classify its target
    #[default]
    Follow,
    /// Hash the link itself as if it were a regular file
    #[serde(rename = "copy")]
    CopyAsLeaf,
    /// Skip links entirely
    Ignore,
}

impl SymlinkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymlinkPolicy::Follow => "follow",
            SymlinkPolicy::CopyAsLeaf => "copy",
            SymlinkPolicy::Ignore => "ignore",
        }
    }
}

impl fmt::Display for SymlinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymlinkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "follow" => Ok(SymlinkPolicy::Follow),
            "copy" | "copy-as-leaf" => Ok(SymlinkPolicy::CopyAsLeaf),
            "ignore" => Ok(SymlinkPolicy::Ignore),
            other => Err(format!(
                "Invalid symlink policy: {} (must be 'follow', 'copy' or 'ignore')",
                other
            )),
        }
    }
}

/// How a leaf entry was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EntryKind {
    /// A regular file
    File,
    /// A symlink hashed as itself
    SymlinkCopy,
    /// A symlink resolved to a regular file
    FollowedSymlink { target: PathBuf },
}

/// Classified directory entry
#[derive(Debug, Clone)]
pub enum Entry {
    /// An entry that contributes one leaf digest
    Leaf {
        /// Raw file name; the entry's identity within its directory
        file_name: OsString,
        /// NFC-normalized, lossy rendering of `file_name` for display
        name: String,
        path: PathBuf,
        modified: SystemTime,
        kind: EntryKind,
    },
    /// A subdirectory, left to the caller to snapshot on its own
    Directory { path: PathBuf },
}

pub(crate) fn default_max_symlink_depth() -> usize {
    32
}

/// Walker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerConfig {
    pub symlinks: SymlinkPolicy,
    /// Maximum number of links resolved for one entry under `Follow`
    pub max_symlink_depth: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            symlinks: SymlinkPolicy::default(),
            max_symlink_depth: default_max_symlink_depth(),
        }
    }
}

/// Non-recursive directory walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// List and classify the direct children of the root
    ///
    /// Entries are returned in filesystem enumeration order. Ignored symlinks,
    /// dangling symlinks and unsupported entry kinds are left out.
    pub fn walk(&self) -> Result<Vec<Entry>, SnapshotError> {
        let metadata =
            fs::metadata(&self.root).map_err(|e| SnapshotError::filesystem(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(SnapshotError::InvalidPath(format!(
                "Not a directory: {:?}",
                self.root
            )));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                SnapshotError::filesystem(path, io::Error::from(e))
            })?;

            if let Some(classified) = self.classify(&entry)? {
                entries.push(classified);
            }
        }

        Ok(entries)
    }

    /// Classify one directory entry
    ///
    /// 1. Symlinks are handled per policy: skipped, hashed as themselves, or
    ///    resolved and classified by what they end in
    /// 2. Regular files become leaves carrying their modification time
    /// 3. Directories are deferred to the caller
    /// 4. Anything else (sockets, FIFOs, devices) is logged and skipped
    fn classify(&self, entry: &DirEntry) -> Result<Option<Entry>, SnapshotError> {
        let path = entry.path().to_path_buf();
        let file_name = entry.file_name().to_os_string();
        let name = path::normalize_name(&file_name);
        // Not followed by walkdir, so this is the entry's own type
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            return match self.config.symlinks {
                SymlinkPolicy::Ignore => {
                    trace!(path = %path.display(), "Ignoring symlink");
                    Ok(None)
                }
                SymlinkPolicy::CopyAsLeaf => {
                    // lstat: the link's own mtime, not the target's
                    let modified = modified_time(&path, fs::symlink_metadata(&path))?;
                    Ok(Some(Entry::Leaf {
                        file_name,
                        name,
                        path,
                        modified,
                        kind: EntryKind::SymlinkCopy,
                    }))
                }
                SymlinkPolicy::Follow => self.follow(file_name, name, path),
            };
        }

        if file_type.is_file() {
            let metadata = entry
                .metadata()
                .map_err(|e| SnapshotError::filesystem(&path, io::Error::from(e)))?;
            let modified = modified_time(&path, Ok(metadata))?;
            return Ok(Some(Entry::Leaf {
                file_name,
                name,
                path,
                modified,
                kind: EntryKind::File,
            }));
        }

        if file_type.is_dir() {
            return Ok(Some(Entry::Directory { path }));
        }

        skip_unsupported(path);
        Ok(None)
    }

    /// Resolve a symlink chain and classify what it ends in
    ///
    /// The chain is walked one link at a time, so a cycle can only exhaust
    /// the depth budget. A leaf keeps the link's own name and location; only
    /// the modification time comes from the final target.
    fn follow(
        &self,
        file_name: OsString,
        name: String,
        link: PathBuf,
    ) -> Result<Option<Entry>, SnapshotError> {
        let mut current = link.clone();

        for _ in 0..self.config.max_symlink_depth {
            let target = fs::read_link(&current).map_err(|e| SnapshotError::filesystem(&current, e))?;
            // Relative targets are relative to the directory holding the link
            let target = match current.parent() {
                Some(parent) if target.is_relative() => parent.join(target),
                _ => target,
            };

            let metadata = match fs::symlink_metadata(&target) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(
                        link = %link.display(),
                        target = %target.display(),
                        "Skipping dangling symlink"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(SnapshotError::filesystem(&target, e)),
            };

            let file_type = metadata.file_type();
            // Another hop
            if file_type.is_symlink() {
                current = target;
                continue;
            }
            if file_type.is_file() {
                let modified = modified_time(&target, Ok(metadata))?;
                return Ok(Some(Entry::Leaf {
                    file_name,
                    name,
                    path: link,
                    modified,
                    kind: EntryKind::FollowedSymlink { target },
                }));
            }
            if file_type.is_dir() {
                return Ok(Some(Entry::Directory { path: link }));
            }

            skip_unsupported(target);
            return Ok(None);
        }

        Err(SnapshotError::SymlinkDepthExceeded {
            path: link,
            max_depth: self.config.max_symlink_depth,
        })
    }
}

fn modified_time(path: &Path, metadata: io::Result<fs::Metadata>) -> Result<SystemTime, SnapshotError> {
    metadata
        .and_then(|m| m.modified())
        .map_err(|e| SnapshotError::filesystem(path, e))
}

fn skip_unsupported(path: PathBuf) {
    let err = SnapshotError::UnsupportedEntryKind { path };
    warn!(error = %err, "Skipping entry");
}
