use std::fmt;

use crate::{
    error::validate_depth,
    hash::{Combine, HashValue},
    MerkleError,
};

/// A complete binary Merkle tree of fixed depth.
///
/// Nodes live in a flat array indexed from 1: the root is node 1, node `i`
/// has children `2i` and `2i + 1`, and leaf `k` is node `2^depth + k`.
/// Slot 0 is unused. The tree is built once and never mutated.
#[derive(Clone)]
pub struct MerkleTree<C> {
    depth: u8,
    nodes: Vec<HashValue>,
    combine: C,
}

impl<C: Combine> MerkleTree<C> {
    /// Build a tree over `leaves`, whose length must be a power of two.
    pub fn from_leaves(leaves: &[HashValue], combine: C) -> Result<Self, MerkleError> {
        if !leaves.len().is_power_of_two() {
            return Err(MerkleError::InvalidInput(format!(
                "leaf count must be a power of two, got {}",
                leaves.len()
            )));
        }
        let depth = leaves.len().trailing_zeros() as u8;
        validate_depth(depth)?;

        let leaf_count = leaves.len();
        let mut nodes = vec![HashValue::ZERO; 2 * leaf_count];
        nodes[leaf_count..].copy_from_slice(leaves);
        // Descending order visits every level bottom-up.
        for i in (1..leaf_count).rev() {
            nodes[i] = combine.combine(&nodes[2 * i], &nodes[2 * i + 1]);
        }

        Ok(Self {
            depth,
            nodes,
            combine,
        })
    }
}

impl<C> MerkleTree<C> {
    /// Number of levels below the root.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of leaves (`2^depth`).
    pub fn leaf_count(&self) -> u64 {
        1u64 << self.depth
    }

    /// The root value (node 1).
    pub fn root(&self) -> HashValue {
        self.nodes[1]
    }

    /// The leaf level, in order.
    pub fn leaves(&self) -> &[HashValue] {
        &self.nodes[self.nodes.len() / 2..]
    }

    /// The combiner this tree was built with.
    pub fn combiner(&self) -> &C {
        &self.combine
    }

    /// Absolute node index of leaf `k`.
    pub fn leaf_node_index(&self, k: u64) -> Result<u64, MerkleError> {
        let leaf_count = self.leaf_count();
        if k >= leaf_count {
            return Err(MerkleError::IndexOutOfRange {
                kind: "leaf",
                index: k,
                bound: leaf_count,
            });
        }
        Ok(leaf_count + k)
    }

    /// Value of leaf `k`.
    pub fn leaf(&self, k: u64) -> Result<HashValue, MerkleError> {
        let index = self.leaf_node_index(k)?;
        Ok(self.nodes[index as usize])
    }

    /// Value of the node at absolute index `i` (`1 <= i < 2^(depth+1)`).
    pub fn node(&self, i: u64) -> Result<HashValue, MerkleError> {
        let bound = self.nodes.len() as u64;
        if i == 0 || i >= bound {
            return Err(MerkleError::IndexOutOfRange {
                kind: "node",
                index: i,
                bound,
            });
        }
        Ok(self.nodes[i as usize])
    }
}

impl<C> fmt::Debug for MerkleTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("depth", &self.depth)
            .field("leaf_count", &self.leaf_count())
            .field("root", &self.root())
            .finish()
    }
}

/// Level of absolute index `i` counted from the root (root = 0).
pub(crate) fn level_of(i: u64) -> u8 {
    (63 - i.leading_zeros()) as u8
}

/// Leftmost leaf index (absolute) under node `i` in a tree of `depth`.
pub(crate) fn subtree_start(i: u64, depth: u8) -> u64 {
    i << (depth - level_of(i))
}
