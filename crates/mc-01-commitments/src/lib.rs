//! # Merkle Commitments (Subsystem 1)
//!
//! The fixed binary hash tree used for block-header commitments over the
//! ordered signature lists of transactions, achievements, and reviews.
//!
//! The tree is rebuilt from scratch per block; there is no incremental
//! update path.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod tree;

pub use tree::{merkle_proof, merkle_root, verify_merkle_proof, MerkleProof};
