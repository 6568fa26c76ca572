use assert_matches::assert_matches;
use proptest::prelude::*;

use super::*;
use crate::test_utils::{leaves_from, naive_root, toy_combine, toy_tree};

// ── MerkleTree construction ──────────────────────────────────────────

#[test]
fn test_from_leaves_rejects_non_power_of_two() {
    for len in [0usize, 3, 5, 6, 7, 12] {
        let leaves = vec![HashValue::ZERO; len];
        assert_matches!(
            MerkleTree::from_leaves(&leaves, toy_combine),
            Err(MerkleError::InvalidInput(_)),
            "len = {}",
            len
        );
    }
}

#[test]
fn test_depth_and_layout() {
    let tree = toy_tree(&[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(tree.depth(), 3);
    assert_eq!(tree.leaf_count(), 8);
    assert_eq!(tree.leaves(), leaves_from(&[1, 2, 3, 4, 5, 6, 7, 8]).as_slice());
    assert_eq!(tree.leaf_node_index(0).expect("leaf 0"), 8);
    assert_eq!(tree.leaf_node_index(7).expect("leaf 7"), 15);
    assert_eq!(tree.node(12).expect("node 12"), HashValue::from(5u64));
    assert_eq!(tree.leaf(4).expect("leaf 4"), HashValue::from(5u64));

    for i in 1..8u64 {
        let expected = toy_combine(
            &tree.node(2 * i).expect("left child"),
            &tree.node(2 * i + 1).expect("right child"),
        );
        assert_eq!(tree.node(i).expect("interior"), expected, "node {}", i);
    }
    assert_eq!(tree.root(), tree.node(1).expect("root"));
}

#[test]
fn test_single_leaf_tree() {
    let tree = toy_tree(&[42]);
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.leaf_count(), 1);
    assert_eq!(tree.root(), HashValue::from(42u64));
    assert_eq!(tree.leaf(0).expect("only leaf"), tree.root());
}

#[test]
fn test_accessors_are_bounds_checked() {
    let tree = toy_tree(&[1, 2, 3, 4]);
    assert_matches!(
        tree.leaf(4),
        Err(MerkleError::IndexOutOfRange {
            kind: "leaf",
            index: 4,
            bound: 4
        })
    );
    assert_matches!(
        tree.node(0),
        Err(MerkleError::IndexOutOfRange { kind: "node", index: 0, .. })
    );
    assert_matches!(
        tree.node(8),
        Err(MerkleError::IndexOutOfRange {
            kind: "node",
            index: 8,
            bound: 8
        })
    );
    assert!(tree.node(7).is_ok());
}

#[test]
fn test_root_depends_on_leaf_order() {
    let a = toy_tree(&[1, 2, 3, 4]);
    let b = toy_tree(&[2, 1, 3, 4]);
    assert_ne!(a.root(), b.root());
}

#[test]
fn test_debug_shows_summary() {
    let tree = toy_tree(&[1, 2, 3, 4]);
    let rendered = format!("{:?}", tree);
    assert!(rendered.contains("depth: 2"));
    assert!(rendered.contains("leaf_count: 4"));
    assert!(rendered.contains(&tree.root().to_string()));
}

// ── Update scenarios ─────────────────────────────────────────────────

/// Replace the trailing `replacement.len()` leaves of `leaves`.
fn apply(leaves: &[u64], replacement: &[u64]) -> Vec<u64> {
    let mut out = leaves.to_vec();
    let from = out.len() - replacement.len();
    out[from..].copy_from_slice(replacement);
    out
}

fn check_two_step_update<C: Combine + Copy>(combine: C) {
    let initial = leaves_from(&[1, 2, 3, 4, 5, 0, 0, 0]);
    let tree = MerkleTree::from_leaves(&initial, combine).expect("8 leaves");

    let batch = tree.generate_update(&leaves_from(&[6, 7, 0])).expect("3 < 8");
    let second = MerkleTree::from_leaves(&leaves_from(&[1, 2, 3, 4, 5, 6, 7, 0]), combine)
        .expect("8 leaves");
    batch
        .verify(tree.depth(), &second.root(), &combine)
        .expect("first update reaches [1..7, 0]");

    let batch = second.generate_update(&leaves_from(&[8])).expect("1 < 8");
    let third = MerkleTree::from_leaves(&leaves_from(&[1, 2, 3, 4, 5, 6, 7, 8]), combine)
        .expect("8 leaves");
    batch
        .verify(second.depth(), &third.root(), &combine)
        .expect("second update reaches [1..8]");
}

#[test]
fn test_two_step_update_toy() {
    check_two_step_update(toy_combine as fn(&HashValue, &HashValue) -> HashValue);
}

#[cfg(feature = "sha256")]
#[test]
fn test_two_step_update_sha256() {
    check_two_step_update(Sha256Combine);
}

#[cfg(feature = "blake3")]
#[test]
fn test_two_step_update_blake3() {
    check_two_step_update(Blake3Combine);
}

#[test]
fn test_sequential_slot_filling() {
    // Slot 0 is set at creation; every later slot is filled by replacing
    // the whole unfilled tail with `[value, 0, 0, ...]`.
    let mut current: Vec<u64> = vec![0; 16];
    current[0] = 100;
    for slot in 1..16usize {
        let tree = toy_tree(&current);
        let mut tail = vec![0u64; 16 - slot];
        tail[0] = 100 + slot as u64;

        for policy in [CoalescePolicy::SinglePass, CoalescePolicy::FixedPoint] {
            let batch = tree
                .generate_update_with(&leaves_from(&tail), policy)
                .expect("tail shorter than tree");
            let next = toy_tree(&apply(&current, &tail));
            batch
                .verify(tree.depth(), &next.root(), &toy_combine)
                .unwrap_or_else(|e| panic!("slot {} with {:?}: {}", slot, policy, e));
        }
        current = apply(&current, &tail);
    }
    assert_eq!(current, (100..116).collect::<Vec<u64>>());
}

#[test]
fn test_fixed_point_never_larger_than_single_pass() {
    let values: Vec<u64> = (0..64).collect();
    let tree = toy_tree(&values);
    for m in 1..64usize {
        let replacement = leaves_from(&values[64 - m..]);
        let single = tree
            .generate_update_with(&replacement, CoalescePolicy::SinglePass)
            .expect("m < 64");
        let fixed = tree
            .generate_update_with(&replacement, CoalescePolicy::FixedPoint)
            .expect("m < 64");
        assert!(fixed.nodes().len() <= single.nodes().len(), "m = {}", m);
        assert_eq!(fixed.proof(), single.proof(), "m = {}", m);
    }
}

#[test]
fn test_unchanged_values_keep_root() {
    // Replaying the current tail yields a batch for the current root.
    let tree = toy_tree(&[5, 4, 3, 2, 1, 9, 8, 7]);
    let tail = &tree.leaves()[3..];
    let batch = tree.generate_update(tail).expect("5 < 8");
    batch
        .verify(tree.depth(), &tree.root(), &toy_combine)
        .expect("same leaves, same root");
}

// ── Property tests ───────────────────────────────────────────────────

/// Leaves of a random tree (depth 0..=7) and a replacement tail shorter
/// than the tree.
fn tree_and_tail() -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
    (0u32..=7).prop_flat_map(|depth| {
        let n = 1usize << depth;
        (
            prop::collection::vec(any::<u64>(), n),
            prop::collection::vec(any::<u64>(), 0..n),
        )
    })
}

proptest! {
    #[test]
    fn test_root_matches_naive_oracle((leaves, _) in tree_and_tail()) {
        let tree = toy_tree(&leaves);
        prop_assert_eq!(tree.root(), naive_root(&leaves_from(&leaves), &toy_combine));
    }

    #[test]
    fn test_every_leaf_proof_rebuilds_root((leaves, _) in tree_and_tail()) {
        let tree = toy_tree(&leaves);
        for k in 0..tree.leaf_count() {
            let node_index = tree.leaf_node_index(k).unwrap();
            let proof = tree.proof_for_node(node_index).unwrap();
            prop_assert_eq!(proof.len(), tree.depth() as usize);
            prop_assert!(proof
                .verify(node_index, tree.leaf(k).unwrap(), &tree.root(), &toy_combine)
                .is_ok());
        }
    }

    #[test]
    fn test_update_batch_rebuilds_new_root((leaves, tail) in tree_and_tail()) {
        let tree = toy_tree(&leaves);
        let expected = toy_tree(&apply(&leaves, &tail)).root();
        for policy in [CoalescePolicy::SinglePass, CoalescePolicy::FixedPoint] {
            let batch = tree.generate_update_with(&leaves_from(&tail), policy).unwrap();
            if tail.is_empty() {
                prop_assert!(batch.is_empty());
            } else {
                prop_assert!(batch.verify(tree.depth(), &expected, &toy_combine).is_ok());
            }
        }
    }

    #[test]
    fn test_fixed_point_batch_is_minimal((leaves, tail) in tree_and_tail()) {
        let tree = toy_tree(&leaves);
        let batch = tree.generate_update(&leaves_from(&tail)).unwrap();
        let from = leaves.len() - tail.len();
        prop_assert_eq!(batch.nodes().len(), tail.len().count_ones() as usize);
        if !tail.is_empty() {
            prop_assert_eq!(batch.proof().len(), from.count_ones() as usize);
        }
        let first_leaf = (leaves.len() + from) as u64;
        for entry in batch.proof() {
            prop_assert_eq!(entry.index & 1, 0, "boundary siblings are left siblings");
            let shift = tree.depth() - crate::tree::level_of(entry.index);
            prop_assert!((entry.index << shift) < first_leaf);
        }
    }
}
