//! Root reconstruction for update batches.
//!
//! Pure function: no tree required, only the depth and the combiner the
//! tree was built with. Mirrors the external state machine that consumes
//! batches, so producers can check a batch before shipping it.

use std::collections::BTreeMap;

use crate::{
    error::{validate_depth, MAX_DEPTH},
    hash::{Combine, HashValue},
    tree::level_of,
    update::UpdateBatch,
    MerkleError,
};

/// Maximum number of elements per batch field, to bound verification cost.
const MAX_BATCH_ELEMENTS: usize = 100_000;

impl UpdateBatch {
    /// Rebuild the root of a `depth`-deep tree from this batch.
    ///
    /// `nodes` and `proof` together must cover the tree without overlap:
    /// no index may repeat and no entry may sit above another one.
    pub fn compute_root<C: Combine>(
        &self,
        depth: u8,
        combine: &C,
    ) -> Result<HashValue, MerkleError> {
        validate_depth(depth).map_err(|_| {
            MerkleError::InvalidProof(format!(
                "invalid depth {} (must be at most {})",
                depth, MAX_DEPTH
            ))
        })?;
        if self.is_empty() {
            return Err(MerkleError::InvalidProof(
                "empty update batch carries no root".into(),
            ));
        }
        if self.nodes.len() > MAX_BATCH_ELEMENTS || self.proof.len() > MAX_BATCH_ELEMENTS {
            return Err(MerkleError::InvalidProof(format!(
                "batch contains too many elements (max {} per field)",
                MAX_BATCH_ELEMENTS
            )));
        }

        let bound = 2u64 << depth;
        let mut known: BTreeMap<u64, HashValue> = BTreeMap::new();

        for node in &self.nodes {
            check_index(node.index, bound)?;
            if node.depth != level_of(node.index) {
                return Err(MerkleError::InvalidProof(format!(
                    "update node {} claims depth {} but sits at depth {}",
                    node.index,
                    node.depth,
                    level_of(node.index)
                )));
            }
            if known.insert(node.index, node.value).is_some() {
                return Err(MerkleError::InvalidProof(format!(
                    "duplicate update node at index {}",
                    node.index
                )));
            }
        }
        for entry in &self.proof {
            check_index(entry.index, bound)?;
            if known.insert(entry.index, entry.value).is_some() {
                return Err(MerkleError::InvalidProof(format!(
                    "proof entry at index {} overlaps another entry",
                    entry.index
                )));
            }
        }

        // An entry above another would make the lower one dead weight or,
        // worse, let a stale value shadow a fresh one.
        for &index in known.keys() {
            let mut ancestor = index >> 1;
            while ancestor > 0 {
                if known.contains_key(&ancestor) {
                    return Err(MerkleError::InvalidProof(format!(
                        "entry at index {} is an ancestor of entry {}",
                        ancestor, index
                    )));
                }
                ancestor >>= 1;
            }
        }

        recompute(1, bound >> 1, &known, combine)
    }

    /// Check that the batch rebuilds `expected_root`.
    pub fn verify<C: Combine>(
        &self,
        depth: u8,
        expected_root: &HashValue,
        combine: &C,
    ) -> Result<(), MerkleError> {
        let computed = self.compute_root(depth, combine)?;
        if &computed != expected_root {
            return Err(MerkleError::InvalidProof(format!(
                "root hash mismatch: expected {}, got {}",
                expected_root, computed
            )));
        }
        Ok(())
    }
}

fn check_index(index: u64, bound: u64) -> Result<(), MerkleError> {
    if index == 0 || index >= bound {
        return Err(MerkleError::InvalidProof(format!(
            "index {} outside the tree (bound {})",
            index, bound
        )));
    }
    Ok(())
}

/// Recursively recompute the value of node `index`.
fn recompute<C: Combine>(
    index: u64,
    first_leaf: u64,
    known: &BTreeMap<u64, HashValue>,
    combine: &C,
) -> Result<HashValue, MerkleError> {
    if let Some(value) = known.get(&index) {
        return Ok(*value);
    }
    if index >= first_leaf {
        return Err(MerkleError::InvalidProof(format!(
            "incomplete batch: nothing covers leaf node {}",
            index
        )));
    }
    let left = recompute(2 * index, first_leaf, known, combine)?;
    let right = recompute(2 * index + 1, first_leaf, known, combine)?;
    Ok(combine.combine(&left, &right))
}
