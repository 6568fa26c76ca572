//! Update batches for a trailing range of leaves.
//!
//! Replacing the last `m` leaves of a tree only changes nodes whose subtree
//! touches that range. An [`UpdateBatch`] carries the new values of the
//! fully replaced subtrees (`nodes`) and the untouched boundary siblings
//! (`proof`) a verifier needs to rebuild the new root from them.
//!
//! Leaf `from = 2^depth - m` is the first replaced leaf. Every path sibling
//! of `from` to its left lies outside the range and goes into `proof`;
//! everything to its right is covered by `nodes`.

use bincode::{Decode, Encode};

use crate::{
    hash::{Combine, HashValue},
    proof::{decode_from_slice, encode_to_vec, ProofEntry},
    tree::{subtree_start, MerkleTree},
    MerkleError,
};

/// A node the verifier accepts without further proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct UpdateNode {
    /// Absolute tree index.
    pub index: u64,
    /// New value of the node.
    pub value: HashValue,
    /// Level of the node counted from the root; freshly replaced leaves
    /// carry the tree depth and every merge moves one level up.
    pub depth: u8,
}

impl UpdateNode {
    fn is_left_sibling_of(&self, right: &UpdateNode) -> bool {
        self.depth == right.depth && self.index ^ right.index == 1 && self.index & 1 == 0
    }

    fn merge_with<C: Combine>(&self, right: &UpdateNode, combine: &C) -> UpdateNode {
        UpdateNode {
            index: self.index >> 1,
            value: combine.combine(&self.value, &right.value),
            depth: self.depth - 1,
        }
    }
}

/// How replaced leaves are folded into parent nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoalescePolicy {
    /// One left-to-right scan over the replaced leaves; adjacent sibling
    /// leaves merge once and merged parents are never revisited.
    SinglePass,
    /// Merge until no two siblings remain, so every maximal fully-replaced
    /// subtree is reported as a single node.
    #[default]
    FixedPoint,
}

/// New subtree values plus the boundary siblings needed to rebuild the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct UpdateBatch {
    pub(crate) nodes: Vec<UpdateNode>,
    pub(crate) proof: Vec<ProofEntry>,
}

impl UpdateBatch {
    /// Assemble a batch from parts, e.g. received from another producer.
    pub fn new(nodes: Vec<UpdateNode>, proof: Vec<ProofEntry>) -> Self {
        UpdateBatch { nodes, proof }
    }

    /// Replaced subtrees, left to right.
    pub fn nodes(&self) -> &[UpdateNode] {
        &self.nodes
    }

    /// Boundary siblings outside the replaced range, leaf-adjacent first.
    pub fn proof(&self) -> &[ProofEntry] {
        &self.proof
    }

    /// Whether the batch replaces nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.proof.is_empty()
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, MerkleError> {
        encode_to_vec(self)
    }

    /// Decode from bytes using bincode.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self, MerkleError> {
        decode_from_slice(bytes)
    }
}

impl<C: Combine> MerkleTree<C> {
    /// Batch replacing the trailing `leaves.len()` leaves, coalesced to a
    /// fixed point.
    pub fn generate_update(&self, leaves: &[HashValue]) -> Result<UpdateBatch, MerkleError> {
        self.generate_update_with(leaves, CoalescePolicy::default())
    }

    /// Batch replacing the trailing `leaves.len()` leaves.
    ///
    /// `leaves` must be shorter than the tree; a full replacement has no
    /// boundary to prove against and should build a fresh tree instead.
    pub fn generate_update_with(
        &self,
        leaves: &[HashValue],
        policy: CoalescePolicy,
    ) -> Result<UpdateBatch, MerkleError> {
        let leaf_count = self.leaf_count();
        if leaves.len() as u64 >= leaf_count {
            return Err(MerkleError::InvalidInput(format!(
                "cannot replace {} leaves of a tree with {} leaves",
                leaves.len(),
                leaf_count
            )));
        }
        if leaves.is_empty() {
            return Ok(UpdateBatch::default());
        }

        let first = leaf_count + (leaf_count - leaves.len() as u64);
        let seeds = leaves
            .iter()
            .zip(first..)
            .map(|(value, index)| UpdateNode {
                index,
                value: *value,
                depth: self.depth(),
            });
        let nodes = match policy {
            CoalescePolicy::SinglePass => coalesce_single_pass(seeds, self.combiner()),
            CoalescePolicy::FixedPoint => coalesce_fixed_point(seeds, self.combiner()),
        };

        // Siblings whose subtree starts at or after `first` are inside the
        // replaced range: they are either in `nodes` or derivable from them.
        let depth = self.depth();
        let proof = self
            .proof_for_node(first)?
            .into_entries()
            .into_iter()
            .filter(|entry| subtree_start(entry.index, depth) < first)
            .collect();

        Ok(UpdateBatch { nodes, proof })
    }
}

fn coalesce_single_pass<C: Combine>(
    seeds: impl Iterator<Item = UpdateNode>,
    combine: &C,
) -> Vec<UpdateNode> {
    let mut seeds = seeds.peekable();
    let mut out = Vec::new();
    while let Some(node) = seeds.next() {
        match seeds.next_if(|right| node.is_left_sibling_of(right)) {
            Some(right) => out.push(node.merge_with(&right, combine)),
            None => out.push(node),
        }
    }
    out
}

fn coalesce_fixed_point<C: Combine>(
    seeds: impl Iterator<Item = UpdateNode>,
    combine: &C,
) -> Vec<UpdateNode> {
    let mut stack: Vec<UpdateNode> = Vec::new();
    for seed in seeds {
        let mut node = seed;
        while let Some(left) = stack.pop() {
            if left.is_left_sibling_of(&node) {
                node = left.merge_with(&node, combine);
            } else {
                stack.push(left);
                break;
            }
        }
        stack.push(node);
    }
    stack
}
