//! Digest computation for tree nodes and directory entries
//!
//! The hash primitive is injected through [`DigestAlgorithm`]; BLAKE3 is the
//! default everywhere.

use crate::types::{Digest, DIGEST_LEN};
use std::time::{SystemTime, UNIX_EPOCH};

/// A fixed-width, deterministic, collision-resistant hash function
pub trait DigestAlgorithm {
    fn hash(data: &[u8]) -> [u8; DIGEST_LEN];
}

/// BLAKE3 with its standard 32-byte output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl DigestAlgorithm for Blake3 {
    fn hash(data: &[u8]) -> [u8; DIGEST_LEN] {
        *blake3::hash(data).as_bytes()
    }
}

/// Compute the parent of two tree nodes
///
/// parent = hash(left.bytes || right.bytes)
///
/// An unpaired node at the end of a level is combined with itself.
pub fn compute_parent_digest<A: DigestAlgorithm>(left: &Digest, right: &Digest) -> Digest {
    let mut buf = [0u8; DIGEST_LEN * 2];
    buf[..DIGEST_LEN].copy_from_slice(left.bytes());
    buf[DIGEST_LEN..].copy_from_slice(right.bytes());
    Digest::make_with::<A>(buf)
}

/// Compute the leaf digest of a directory entry from its identity metadata
///
/// leaf = hash(name || relative_parent || timestamp)
///
/// `name` is the entry's raw file name as stored on disk, so two names that
/// only differ in Unicode normalization (or in invalid UTF-8 bytes) hash
/// differently. File content is never read: an entry whose bytes change
/// without its modification time changing keeps the same digest.
pub fn compute_entry_digest<A: DigestAlgorithm>(
    name: impl AsRef<[u8]>,
    relative_parent: &str,
    modified: SystemTime,
) -> Digest {
    let name = name.as_ref();
    let timestamp = format_timestamp(modified);

    let mut input = Vec::with_capacity(name.len() + relative_parent.len() + timestamp.len());
    input.extend_from_slice(name);
    input.extend_from_slice(relative_parent.as_bytes());
    input.extend_from_slice(timestamp.as_bytes());
    Digest::make_with::<A>(input)
}

/// Compute the digest summarizing a whole snapshot
///
/// snapshot = hash(top.hex || directory_name)
pub fn compute_snapshot_digest<A: DigestAlgorithm>(top: &Digest, name: &str) -> Digest {
    let mut input = top.to_hex();
    input.push_str(name);
    Digest::make_with::<A>(input)
}

/// Render a modification time as `<secs>.<nanos>` relative to the UNIX epoch
pub fn format_timestamp(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => format!("{}.{:09}", since.as_secs(), since.subsec_nanos()),
        Err(before) => {
            let before = before.duration();
            format!("-{}.{:09}", before.as_secs(), before.subsec_nanos())
        }
    }
}
