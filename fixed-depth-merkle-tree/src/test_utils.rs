//! Test utilities: a cheap combiner and a reference root oracle.

use crate::{Combine, HashValue, MerkleTree};

/// Combiner used by most tests.
pub(crate) type ToyCombine = fn(&HashValue, &HashValue) -> HashValue;

/// Order-sensitive toy combiner over the low 64 bits.
///
/// Both operands are multiplied by odd constants, so changing either child
/// always changes the parent.
pub(crate) fn toy_combine(left: &HashValue, right: &HashValue) -> HashValue {
    HashValue::from(
        left.low_u64()
            .wrapping_mul(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(right.low_u64().wrapping_mul(3))
            .wrapping_add(1),
    )
}

pub(crate) fn leaves_from(values: &[u64]) -> Vec<HashValue> {
    values.iter().copied().map(HashValue::from).collect()
}

/// Tree over `values` using [`toy_combine`]. Panics on a bad leaf count.
pub(crate) fn toy_tree(values: &[u64]) -> MerkleTree<ToyCombine> {
    MerkleTree::from_leaves(&leaves_from(values), toy_combine as ToyCombine)
        .expect("leaf count must be a power of two")
}

/// Root by naive recursive halving, independent of the array layout.
pub(crate) fn naive_root<C: Combine>(leaves: &[HashValue], combine: &C) -> HashValue {
    if leaves.len() == 1 {
        return leaves[0];
    }
    let (left, right) = leaves.split_at(leaves.len() / 2);
    combine.combine(&naive_root(left, combine), &naive_root(right, combine))
}
