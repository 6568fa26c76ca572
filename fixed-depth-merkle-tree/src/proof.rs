//! Inclusion proofs for the fixed-depth Merkle tree.
//!
//! A proof is the list of sibling values on the path from a leaf to the
//! root, leaf-adjacent sibling first. Each entry carries the sibling's
//! absolute index so a verifier can tell left from right without extra
//! flags.

use bincode::{Decode, Encode};

use crate::{
    hash::{Combine, HashValue},
    tree::MerkleTree,
    MerkleError,
};

/// A sibling needed while rebuilding the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ProofEntry {
    /// Absolute tree index of the sibling.
    pub index: u64,
    /// The sibling's value.
    pub value: HashValue,
}

/// An inclusion proof for a single leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct MerkleProof {
    entries: Vec<ProofEntry>,
}

impl<C> MerkleTree<C> {
    /// Sibling path from the leaf-level node `i` up to the root.
    ///
    /// The result always has exactly `depth` entries.
    pub fn proof_for_node(&self, i: u64) -> Result<MerkleProof, MerkleError> {
        let leaf_count = self.leaf_count();
        if i < leaf_count || i >= 2 * leaf_count {
            return Err(MerkleError::IndexOutOfRange {
                kind: "leaf node",
                index: i,
                bound: 2 * leaf_count,
            });
        }

        let mut entries = Vec::with_capacity(self.depth() as usize);
        let mut index = i;
        for _ in 0..self.depth() {
            let sibling = index ^ 1;
            entries.push(ProofEntry {
                index: sibling,
                value: self.node(sibling)?,
            });
            index >>= 1;
        }
        Ok(MerkleProof { entries })
    }

    /// Sibling path for leaf `k`.
    pub fn proof_for_leaf(&self, k: u64) -> Result<MerkleProof, MerkleError> {
        self.proof_for_node(self.leaf_node_index(k)?)
    }
}

impl MerkleProof {
    /// Wrap pre-computed entries, leaf-adjacent sibling first.
    pub fn new(entries: Vec<ProofEntry>) -> Self {
        MerkleProof { entries }
    }

    /// The sibling entries, leaf-adjacent first.
    pub fn entries(&self) -> &[ProofEntry] {
        &self.entries
    }

    /// Consume the proof, returning its entries.
    pub fn into_entries(self) -> Vec<ProofEntry> {
        self.entries
    }

    /// Number of siblings (equal to the tree depth).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the proof has no entries (depth-0 tree).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sibling values without their indices.
    pub fn values(&self) -> Vec<HashValue> {
        self.entries.iter().map(|entry| entry.value).collect()
    }

    /// Rebuild the root from the node at `node_index` holding `value`.
    ///
    /// Every entry must be the sibling of the node reached so far, and the
    /// walk must end exactly at the root.
    pub fn compute_root<C: Combine>(
        &self,
        node_index: u64,
        value: HashValue,
        combine: &C,
    ) -> Result<HashValue, MerkleError> {
        if node_index == 0 {
            return Err(MerkleError::InvalidProof(
                "node index 0 is not part of the tree".into(),
            ));
        }

        let mut index = node_index;
        let mut acc = value;
        for entry in &self.entries {
            if index == 1 {
                return Err(MerkleError::InvalidProof(format!(
                    "proof has {} entries but reached the root early",
                    self.entries.len()
                )));
            }
            if entry.index != index ^ 1 {
                return Err(MerkleError::InvalidProof(format!(
                    "entry at index {} is not the sibling of node {}",
                    entry.index, index
                )));
            }
            acc = if index & 1 == 0 {
                combine.combine(&acc, &entry.value)
            } else {
                combine.combine(&entry.value, &acc)
            };
            index >>= 1;
        }

        if index != 1 {
            return Err(MerkleError::InvalidProof(format!(
                "proof ended at node {} instead of the root",
                index
            )));
        }
        Ok(acc)
    }

    /// Check that `value` at `node_index` rebuilds `expected_root`.
    pub fn verify<C: Combine>(
        &self,
        node_index: u64,
        value: HashValue,
        expected_root: &HashValue,
        combine: &C,
    ) -> Result<(), MerkleError> {
        let computed = self.compute_root(node_index, value, combine)?;
        if &computed != expected_root {
            return Err(MerkleError::InvalidProof(format!(
                "root hash mismatch: expected {}, got {}",
                expected_root, computed
            )));
        }
        Ok(())
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

pub(crate) fn encode_to_vec<T: Encode>(value: &T) -> Result<Vec<u8>, MerkleError> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_no_limit();
    bincode::encode_to_vec(value, config)
        .map_err(|e| MerkleError::InvalidProof(format!("encode error: {}", e)))
}

pub(crate) fn decode_from_slice<T: Decode<()>>(bytes: &[u8]) -> Result<T, MerkleError> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_limit::<{ 100 * 1024 * 1024 }>(); // 100MB limit
    let (value, read) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| MerkleError::InvalidProof(format!("decode error: {}", e)))?;
    if read != bytes.len() {
        return Err(MerkleError::InvalidProof(format!(
            "decode error: {} trailing bytes",
            bytes.len() - read
        )));
    }
    Ok(value)
}
