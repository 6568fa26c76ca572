//! Fixed-depth binary Merkle tree.
//!
//! A complete binary tree over `2^depth` leaves, stored as a flat array
//! (root at index 1, children of `i` at `2i` and `2i + 1`). The combine
//! function is injected by the caller, so the same tree works with a toy
//! combiner in tests and a cryptographic one in production.
//!
//! # Core types
//!
//! - [`MerkleTree`] — build from leaves, read nodes, produce proofs.
//! - [`MerkleProof`] — leaf inclusion proof (verify, compute root).
//! - [`UpdateBatch`] — minimal certificate for replacing a trailing range of
//!   leaves, plus the reference verifier that rebuilds the new root.
//! - [`HashValue`] / [`Combine`] — 256-bit node values and the combine
//!   capability ([`Blake3Combine`], [`Sha256Combine`] behind features).

#![warn(missing_docs)]

mod error;
pub(crate) mod hash;
pub(crate) mod proof;
pub(crate) mod tree;
pub(crate) mod update;
mod verify;

#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod tests;

pub use error::{MerkleError, MAX_DEPTH};
#[cfg(feature = "blake3")]
pub use hash::Blake3Combine;
#[cfg(feature = "sha256")]
pub use hash::Sha256Combine;
pub use hash::{Combine, HashValue, HASH_SIZE};
pub use proof::{MerkleProof, ProofEntry};
pub use tree::MerkleTree;
pub use update::{CoalescePolicy, UpdateBatch, UpdateNode};
