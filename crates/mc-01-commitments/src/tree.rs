//! # Merkle Tree Construction and Proofs
//!
//! # Algorithm
//!
//! 1. Hash every item to form the leaf level
//! 2. Pair adjacent hashes: `Keccak256(left || right)`, duplicating the
//!    last element of an odd level onto itself
//! 3. Repeat until one hash remains
//!
//! A proof records the sibling at each level plus the leaf index; the
//! verifier replays the pairing, choosing left/right placement from the
//! parity of `index >> level`.
//!
//! # Time Complexity: O(n) build, O(log n) proof/verify

use serde::{Deserialize, Serialize};
use shared_crypto::{keccak256, keccak256_parts};

/// A 32-byte tree node hash.
pub type Hash = [u8; 32];

/// An inclusion proof for one item of a committed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The item's position in the original list.
    pub index: usize,
    /// The sibling hash at each level, leaf level first.
    pub siblings: Vec<Hash>,
}

/// Compute the commitment root over an ordered item list.
///
/// - Empty list commits to `Keccak256("")`
/// - A single item commits to `Keccak256(item)`
pub fn merkle_root<T: AsRef<[u8]>>(items: &[T]) -> Hash {
    if items.is_empty() {
        return keccak256(b"");
    }

    let mut level: Vec<Hash> = items.iter().map(|item| keccak256(item.as_ref())).collect();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Build the inclusion proof for `target`.
///
/// Returns `None` when `target` is not in the list. When the same item
/// appears more than once the proof targets its first occurrence.
pub fn merkle_proof<T: AsRef<[u8]>>(items: &[T], target: &[u8]) -> Option<MerkleProof> {
    let index = items.iter().position(|item| item.as_ref() == target)?;

    let mut siblings = Vec::new();
    let mut level: Vec<Hash> = items.iter().map(|item| keccak256(item.as_ref())).collect();
    let mut position = index;

    while level.len() > 1 {
        let sibling = if position % 2 == 0 {
            // Right sibling, or the element itself when it closes an odd level.
            *level.get(position + 1).unwrap_or(&level[position])
        } else {
            level[position - 1]
        };
        siblings.push(sibling);

        level = next_level(&level);
        position /= 2;
    }

    Some(MerkleProof { index, siblings })
}

/// Verify an inclusion proof against a commitment root.
pub fn verify_merkle_proof(root: &Hash, item: &[u8], proof: &MerkleProof) -> bool {
    let mut current = keccak256(item);
    let mut position = proof.index;

    for sibling in &proof.siblings {
        current = if position % 2 == 0 {
            keccak256_parts(&[&current, sibling])
        } else {
            keccak256_parts(&[sibling, &current])
        };
        position /= 2;
    }

    current == *root
}

/// Pair adjacent hashes, duplicating a trailing odd element.
fn next_level(level: &[Hash]) -> Vec<Hash> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for chunk in level.chunks(2) {
        let left = &chunk[0];
        let right = chunk.get(1).unwrap_or(left);
        next.push(keccak256_parts(&[left, right]));
    }
    next
}
