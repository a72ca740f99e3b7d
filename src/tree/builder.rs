//! Bottom-up binary Merkle tree over an ordered sequence of digests

use crate::error::TreeError;
use crate::tree::hasher::{self, Blake3, DigestAlgorithm};
use crate::types::Digest;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument, trace};

/// Binary reduction tree
///
/// Level 0 holds the leaves in the order they were supplied. Each higher
/// level pairs adjacent nodes left to right; an unpaired last node is
/// combined with itself. The single node of the highest level is the top.
pub struct MerkleTree<A: DigestAlgorithm = Blake3> {
    leaves: Vec<Digest>,
    /// Levels above the leaves, lowest first. Empty until built.
    upper: Vec<Vec<Digest>>,
    top: Digest,
    built: bool,
    _algorithm: PhantomData<fn() -> A>,
}

impl<A: DigestAlgorithm> MerkleTree<A> {
    /// An empty, built tree
    pub fn new() -> Self {
        Self::with_leaves(Vec::new())
    }

    /// Hold `leaves` without building; call [`MerkleTree::build_from_self`] next
    pub fn with_leaves(leaves: Vec<Digest>) -> Self {
        let built = leaves.is_empty();
        Self {
            leaves,
            upper: Vec::new(),
            top: Digest::empty(),
            built,
            _algorithm: PhantomData,
        }
    }

    /// Create a tree from `leaves` and build it immediately
    pub fn from_leaves(leaves: Vec<Digest>) -> Self {
        let mut tree = Self::with_leaves(leaves);
        tree.build_from_self();
        tree
    }

    /// Replace the tree's state with one built from `leaves`
    pub fn build(&mut self, leaves: Vec<Digest>) {
        self.leaves = leaves;
        self.build_from_self();
    }

    /// Rebuild every level from the leaves currently held
    ///
    /// Any previously built levels are discarded. The build proceeds in
    /// three steps:
    /// 1. An empty leaf sequence yields a built tree with an empty top
    /// 2. Each level is reduced into the next by hashing adjacent pairs,
    ///    pairing an unpaired last node with itself
    /// 3. Reduction stops at a level of width one, whose node is the top
    #[instrument(skip(self), fields(leaf_count = self.leaves.len()))]
    pub fn build_from_self(&mut self) {
        self.upper.clear();
        self.built = true;

        // Step 1: nothing to reduce
        if self.leaves.is_empty() {
            self.top = Digest::empty();
            trace!("Built empty tree");
            return;
        }

        // Step 2: reduce level by level, leaves first
        let mut current = &self.leaves;
        while current.len() > 1 {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hasher::compute_parent_digest::<A>(left, right),
                    [last] => hasher::compute_parent_digest::<A>(last, last),
                    _ => unreachable!("chunks(2) yields one or two elements"),
                })
                .collect();
            self.upper.push(next);
            current = &self.upper[self.upper.len() - 1];
        }
        // Step 3: the last level holds exactly one node
        self.top = current[0];

        debug!(
            depth = self.upper.len(),
            node_count = self.node_count(),
            top = %self.top,
            "Merkle tree built"
        );
    }

    /// The root digest; empty for an empty or unbuilt tree
    pub fn top(&self) -> Digest {
        self.top
    }

    /// Node count per level, leaves first
    ///
    /// An empty tree has no levels. An unbuilt tree reports only its leaves.
    pub fn levels(&self) -> Vec<usize> {
        if self.leaves.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.leaves.len())
            .chain(self.upper.iter().map(Vec::len))
            .collect()
    }

    /// Total node count across all levels
    pub fn node_count(&self) -> usize {
        self.leaves.len() + self.upper.iter().map(Vec::len).sum::<usize>()
    }

    /// The digests at `level` (0 = leaves)
    pub fn level(&self, level: usize) -> Option<&[Digest]> {
        match level {
            0 if !self.leaves.is_empty() => Some(&self.leaves),
            0 => None,
            k => self.upper.get(k - 1).map(Vec::as_slice),
        }
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Whether the two tops differ
    pub fn differs_from(&self, other: &Self) -> bool {
        self.top != other.top
    }

    /// Append every leaf of `other` that sits at a position where the two
    /// trees disagree, returning whether any leaf differs
    ///
    /// Descent starts at the top and skips every subtree whose digests match
    /// on both sides, so the work is bounded by depth times the number of
    /// changed leaves. Both trees must have been built from leaf sequences of
    /// the same length whose positions correspond; otherwise the call fails
    /// with [`TreeError::StructuralMismatch`] and `out` is left untouched.
    pub fn collect_changed_leaves(
        &self,
        out: &mut Vec<Digest>,
        other: &Self,
    ) -> Result<bool, TreeError> {
        let (left, right) = (self.levels(), other.levels());
        if left != right || !self.built || !other.built {
            return Err(TreeError::StructuralMismatch { left, right });
        }
        if self.is_empty() {
            return Ok(false);
        }

        let before = out.len();
        self.descend(other, self.upper.len(), 0, out);
        let changed = out.len() > before;

        trace!(changed_leaves = out.len() - before, "Collected changed leaves");
        Ok(changed)
    }

    /// Visit node `index` at `level` on both trees
    ///
    /// Matching nodes prune the whole subtree. Where the nodes differ, a leaf
    /// is recorded from `other` and an inner node recurses into its children.
    fn descend(&self, other: &Self, level: usize, index: usize, out: &mut Vec<Digest>) {
        let (Some(ours), Some(theirs)) = (self.level(level), other.level(level)) else {
            return;
        };
        // Identical subtree, nothing below can differ
        if ours[index] == theirs[index] {
            return;
        }
        if level == 0 {
            out.push(theirs[index]);
            return;
        }

        // A self-paired last node has only one real child
        let below = level - 1;
        let child_count = self.level(below).map_or(0, <[Digest]>::len);
        let first = index * 2;
        for child in first..(first + 2).min(child_count) {
            self.descend(other, below, child, out);
        }
    }
}

impl<A: DigestAlgorithm> Default for MerkleTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: DigestAlgorithm> Clone for MerkleTree<A> {
    fn clone(&self) -> Self {
        Self {
            leaves: self.leaves.clone(),
            upper: self.upper.clone(),
            top: self.top,
            built: self.built,
            _algorithm: PhantomData,
        }
    }
}

impl<A: DigestAlgorithm> fmt::Debug for MerkleTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("levels", &self.levels())
            .field("top", &self.top)
            .field("built", &self.built)
            .finish()
    }
}
