//! treesync: Merkle-tree change detection for directory synchronization
//!
//! A [`DirectorySnapshot`] lists the direct children of one directory, hashes
//! each entry's identity metadata (name, relative location, modification
//! time) into a leaf digest and reduces the leaves into a [`MerkleTree`].
//! Two snapshots compare by their digests; when they differ, a guided descent
//! through both trees finds the entries that changed without visiting the
//! unchanged ones.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod snapshot;
pub mod tree;
pub mod types;
pub mod watch;

pub use error::{ApiError, SnapshotError, TreeError};
pub use snapshot::{DirectorySnapshot, LeafOrder, SnapshotEntry, SnapshotOptions};
pub use tree::{Blake3, DigestAlgorithm, MerkleTree, SymlinkPolicy};
pub use types::{Digest, DIGEST_LEN};
