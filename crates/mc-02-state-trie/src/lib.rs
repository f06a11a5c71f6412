//! # Sparse Address Trie (Subsystem 2)
//!
//! The authoritative account-state commitment referenced by
//! `accounts_root` in every block header: a binary trie of fixed depth
//! equal to the address bit length, where an absent child at any node
//! stands in for a fixed default hash.
//!
//! Light nodes verify fetched accounts against a header's accounts root
//! using the 160-entry proofs produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod trie;

pub use trie::{verify_account_proof, SparseAddressTrie, DEFAULT_NODE_HASH, TRIE_DEPTH};
