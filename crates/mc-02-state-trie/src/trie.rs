//! # Sparse Address Trie
//!
//! A binary trie of fixed depth [`TRIE_DEPTH`] (one level per address
//! bit, MSB first). Each node stores only its hash; absent children stand
//! in for [`DEFAULT_NODE_HASH`]. Interior hashes are
//! `Keccak256(left || right)`, leaves are the account state hash.
//!
//! ## Proof shape
//!
//! A proof is exactly [`TRIE_DEPTH`] [`TrieProofStep`]s, shallowest level
//! first. Verification folds deepest-to-shallowest, placing the running
//! hash left or right according to the corresponding address bit, and
//! compares the result to the root.

use shared_types::{Account, Address, Hash, TrieProofStep};
use shared_crypto::keccak256_parts;
use std::collections::HashMap;

/// Trie depth: one level per bit of a 20-byte address.
pub const TRIE_DEPTH: usize = 160;

/// The fixed hash standing in for any absent node (Keccak-256 of "").
pub const DEFAULT_NODE_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
];

/// Key of a trie node: its depth and the address bits above it (bits at or
/// below the depth are zeroed).
type NodeKey = (u8, Address);

/// The sparse account-state trie.
///
/// `Clone` is cheap enough for the consensus engine's scratch copies
/// during candidate assembly: only touched paths are materialized.
#[derive(Debug, Clone, Default)]
pub struct SparseAddressTrie {
    nodes: HashMap<NodeKey, Hash>,
    accounts: HashMap<Address, Account>,
}

impl SparseAddressTrie {
    /// An empty trie (root = [`DEFAULT_NODE_HASH`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts stored.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the trie holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The current state root.
    pub fn root(&self) -> Hash {
        self.nodes
            .get(&(0, [0u8; 20]))
            .copied()
            .unwrap_or(DEFAULT_NODE_HASH)
    }

    /// Read an account without a proof.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Iterate all stored accounts (unordered).
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Insert or update an account, recomputing every ancestor hash.
    pub fn insert(&mut self, account: Account) {
        let address = account.address;
        let leaf_hash = account.state_hash();
        self.accounts.insert(address, account);
        self.nodes.insert((TRIE_DEPTH as u8, address), leaf_hash);

        // Bottom-up recompute along the path.
        for depth in (0..TRIE_DEPTH).rev() {
            let prefix = masked_prefix(&address, depth);

            // The left child's prefix equals the parent's (next bit 0);
            // the right child has that bit set.
            let left_key = (depth as u8 + 1, prefix);
            let mut right_prefix = prefix;
            right_prefix[depth / 8] |= 1 << (7 - depth % 8);
            let right_key = (depth as u8 + 1, right_prefix);

            let left = self.node_or_default(&left_key);
            let right = self.node_or_default(&right_key);
            self.nodes
                .insert((depth as u8, prefix), keccak256_parts(&[&left, &right]));
        }
    }

    /// Fetch an account together with its inclusion proof.
    ///
    /// Returns `(None, [])` when any node on the address path is absent.
    pub fn get(&self, address: &Address) -> (Option<Account>, Vec<TrieProofStep>) {
        let mut proof = Vec::with_capacity(TRIE_DEPTH);

        for depth in 1..=TRIE_DEPTH {
            let path_prefix = masked_prefix(address, depth);
            if !self.nodes.contains_key(&(depth as u8, path_prefix)) {
                return (None, Vec::new());
            }

            // The sibling shares the prefix except for the bit at this level.
            let mut sibling_prefix = path_prefix;
            sibling_prefix[(depth - 1) / 8] ^= 1 << (7 - (depth - 1) % 8);

            let step = match self.nodes.get(&(depth as u8, sibling_prefix)) {
                Some(hash) => TrieProofStep::Sibling(*hash),
                None => TrieProofStep::Default,
            };
            proof.push(step);
        }

        (self.accounts.get(address).cloned(), proof)
    }

    fn node_or_default(&self, key: &NodeKey) -> Hash {
        self.nodes.get(key).copied().unwrap_or(DEFAULT_NODE_HASH)
    }
}

/// Verify an account's inclusion proof against a state root.
///
/// A proof of any length other than [`TRIE_DEPTH`] fails immediately.
pub fn verify_account_proof(account: &Account, proof: &[TrieProofStep], root: &Hash) -> bool {
    if proof.len() != TRIE_DEPTH {
        return false;
    }

    let mut current = account.state_hash();
    for depth in (1..=TRIE_DEPTH).rev() {
        let sibling = match proof[depth - 1] {
            TrieProofStep::Sibling(hash) => hash,
            TrieProofStep::Default => DEFAULT_NODE_HASH,
        };
        current = if address_bit(&account.address, depth - 1) == 0 {
            keccak256_parts(&[&current, &sibling])
        } else {
            keccak256_parts(&[&sibling, &current])
        };
    }

    current == *root
}

/// The bit of `address` at `index` (0 = MSB of the first byte).
fn address_bit(address: &Address, index: usize) -> u8 {
    (address[index / 8] >> (7 - index % 8)) & 1
}

/// `address` with every bit at or below `depth` cleared.
fn masked_prefix(address: &Address, depth: usize) -> Address {
    let mut prefix = [0u8; 20];
    let full_bytes = depth / 8;
    prefix[..full_bytes].copy_from_slice(&address[..full_bytes]);
    let remainder = depth % 8;
    if remainder > 0 {
        prefix[full_bytes] = address[full_bytes] & (0xFF << (8 - remainder));
    }
    prefix
}
