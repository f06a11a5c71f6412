//! # Entity Validators
//!
//! Each predicate recomputes the entity's signing hash from its own
//! fields and verifies the embedded signature against the embedded public
//! key. The embedded address must also derive from that key, so an entity
//! cannot impersonate another account by swapping keys.
//!
//! Verification failure is not fatal: callers use the boolean to drop the
//! entity silently.

use shared_crypto::{derive_address, verify_hash};
use shared_types::{Achievement, ChainHead, Identity, Review, Transaction};

/// Verify an identity's self-signature and address derivation.
pub fn verify_identity(identity: &Identity) -> bool {
    address_matches(&identity.address, &identity.public_key)
        && verify_hash(
            &identity.public_key,
            &identity.signing_hash(),
            &identity.signature,
        )
}

/// Verify a transaction's signature and sender-address derivation.
pub fn verify_transaction(tx: &Transaction) -> bool {
    address_matches(&tx.sender_address, &tx.sender_public_key)
        && verify_hash(&tx.sender_public_key, &tx.signing_hash(), &tx.signature)
}

/// Verify an achievement's signature and author-address derivation.
pub fn verify_achievement(achievement: &Achievement) -> bool {
    address_matches(&achievement.author_address, &achievement.author_public_key)
        && verify_hash(
            &achievement.author_public_key,
            &achievement.signing_hash(),
            &achievement.signature,
        )
}

/// Verify a review's signature, score ranges, and reviewer-address
/// derivation.
pub fn verify_review(review: &Review) -> bool {
    review.scores.in_range()
        && address_matches(&review.reviewer_address, &review.reviewer_public_key)
        && verify_hash(
            &review.reviewer_public_key,
            &review.signing_hash(),
            &review.signature,
        )
}

/// Verify a chain-head announcement.
///
/// Unsigned heads pass; a signed head must carry a valid signature from a
/// key deriving to the publisher address.
pub fn verify_chain_head(head: &ChainHead) -> bool {
    match (&head.publisher_public_key, &head.signature) {
        (Some(public_key), Some(signature)) => {
            address_matches(&head.publisher_address, public_key)
                && verify_hash(public_key, &head.signing_hash(), signature)
        }
        (None, None) => true,
        // A key without a signature (or vice versa) is malformed.
        _ => false,
    }
}

fn address_matches(address: &shared_types::Address, public_key: &shared_types::PublicKey) -> bool {
    derive_address(public_key).map_or(false, |derived| derived == *address)
}
