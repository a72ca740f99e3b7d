//! Directory Merkle Tree
//!
//! Leaf digests are derived from directory entry metadata, reduced bottom-up
//! into a binary tree whose top summarizes the whole directory.

pub mod builder;
pub mod hasher;
pub mod path;
pub mod walker;

pub use builder::MerkleTree;
pub use hasher::{Blake3, DigestAlgorithm};
pub use walker::{Entry, EntryKind, SymlinkPolicy, Walker, WalkerConfig};
