use thiserror::Error;

/// Deepest tree supported: every absolute index below `2^(depth + 1)` must
/// fit in a `u64`.
pub const MAX_DEPTH: u8 = 62;

/// Errors from Merkle tree operations.
#[derive(Debug, Error)]
pub enum MerkleError {
    /// The call was structurally invalid (bad leaf count, oversized update,
    /// malformed hash value).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A leaf or node index fell outside the tree.
    #[error("{kind} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        /// What was being indexed (`"leaf"` or `"node"`).
        kind: &'static str,
        /// The rejected index.
        index: u64,
        /// Exclusive upper bound for the index.
        bound: u64,
    },
    /// A proof or update batch is malformed, incomplete or does not match
    /// the expected root.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
}

/// Validate that depth is in the allowed range [0, MAX_DEPTH].
pub(crate) fn validate_depth(depth: u8) -> Result<(), MerkleError> {
    if depth > MAX_DEPTH {
        return Err(MerkleError::InvalidInput(format!(
            "depth must be at most {}, got {}",
            MAX_DEPTH, depth
        )));
    }
    Ok(())
}
