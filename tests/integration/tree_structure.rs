//! Integration tests for tree structure correctness

use treesync::tree::hasher::{compute_parent_digest, Blake3};
use treesync::{Digest, MerkleTree, TreeError};

fn leaves(n: usize) -> Vec<Digest> {
    (0..n).map(|i| Digest::make(format!("leaf-{}", i))).collect()
}

/// n + ceil(n/2) + ceil(ceil(n/2)/2) + ... + 1
fn closed_form_node_count(n: usize) -> usize {
    let mut total = n;
    let mut width = n;
    while width > 1 {
        width = (width + 1) / 2;
        total += width;
    }
    total
}

#[test]
fn test_node_counts_match_known_values() {
    for (n, expected) in [(1, 1), (2, 3), (3, 6), (5, 11), (9, 20), (17, 37)] {
        let tree: MerkleTree = MerkleTree::from_leaves(leaves(n));
        assert_eq!(tree.node_count(), expected, "leaf count {}", n);
        assert_eq!(closed_form_node_count(n), expected);
    }
}

#[test]
fn test_node_counts_match_closed_form() {
    for n in 1..=200 {
        let tree: MerkleTree = MerkleTree::from_leaves(leaves(n));
        assert_eq!(tree.node_count(), closed_form_node_count(n), "leaf count {}", n);
        assert_eq!(tree.levels().last(), Some(&1));
    }
}

#[test]
fn test_single_leaf_is_its_own_top() {
    let leaf = Digest::make("only");
    let tree: MerkleTree = MerkleTree::from_leaves(vec![leaf]);
    assert_eq!(tree.top(), leaf);
    assert_eq!(tree.levels(), vec![1]);
}

#[test]
fn test_empty_tree() {
    let tree: MerkleTree = MerkleTree::from_leaves(Vec::new());
    assert!(tree.is_empty());
    assert!(tree.top().is_empty());
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn test_top_follows_pairing_rule() {
    let l = leaves(3);
    let tree: MerkleTree = MerkleTree::from_leaves(l.clone());

    let left = compute_parent_digest::<Blake3>(&l[0], &l[1]);
    let right = compute_parent_digest::<Blake3>(&l[2], &l[2]);
    assert_eq!(tree.top(), compute_parent_digest::<Blake3>(&left, &right));
}

#[test]
fn test_rebuild_is_deterministic() {
    let first: MerkleTree = MerkleTree::from_leaves(leaves(13));
    let mut second: MerkleTree = MerkleTree::new();
    second.build(leaves(13));
    assert_eq!(first.top(), second.top());
    assert!(!first.differs_from(&second));
}

#[test]
fn test_leaf_order_matters() {
    let mut reversed = leaves(4);
    reversed.reverse();
    let forward: MerkleTree = MerkleTree::from_leaves(leaves(4));
    let backward: MerkleTree = MerkleTree::from_leaves(reversed);
    assert!(forward.differs_from(&backward));
}

#[test]
fn test_changed_leaves_for_identical_trees() {
    let a: MerkleTree = MerkleTree::from_leaves(leaves(7));
    let b: MerkleTree = MerkleTree::from_leaves(leaves(7));
    let mut out = Vec::new();
    assert!(!a.collect_changed_leaves(&mut out, &b).unwrap());
    assert!(out.is_empty());
}

#[test]
fn test_changed_leaves_reports_other_side() {
    let a = Digest::make("A");
    let b = Digest::make("B");
    let left: MerkleTree = MerkleTree::from_leaves(vec![a, a, a]);
    let right: MerkleTree = MerkleTree::from_leaves(vec![a, b, a]);

    let mut out = Vec::new();
    assert!(left.collect_changed_leaves(&mut out, &right).unwrap());
    assert_eq!(out, vec![b]);
}

#[test]
fn test_changed_leaves_every_position() {
    let base = leaves(11);
    let original: MerkleTree = MerkleTree::from_leaves(base.clone());
    for position in 0..base.len() {
        let mut modified = base.clone();
        modified[position] = Digest::make(format!("changed-{}", position));
        let tree: MerkleTree = MerkleTree::from_leaves(modified.clone());

        let mut out = Vec::new();
        assert!(original.collect_changed_leaves(&mut out, &tree).unwrap());
        assert_eq!(out, vec![modified[position]], "position {}", position);
    }
}

#[test]
fn test_mismatched_shapes_fail_without_output() {
    let left: MerkleTree = MerkleTree::from_leaves(leaves(4));
    let right: MerkleTree = MerkleTree::from_leaves(leaves(5));

    let mut out = vec![Digest::make("kept")];
    let err = left.collect_changed_leaves(&mut out, &right).unwrap_err();
    assert_eq!(
        err,
        TreeError::StructuralMismatch {
            left: vec![4, 2, 1],
            right: vec![5, 3, 2, 1],
        }
    );
    assert_eq!(out, vec![Digest::make("kept")]);
}
