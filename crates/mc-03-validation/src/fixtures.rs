//! Signed-entity constructors shared by the crate's tests.

use shared_crypto::MeritKeyPair;
use shared_types::{Achievement, Review, ReviewScores, Transaction};

/// A correctly signed transaction from `keypair` to a fixed recipient.
pub(crate) fn signed_transaction(keypair: &MeritKeyPair, amount: u64) -> Transaction {
    let mut tx = Transaction {
        sender_address: keypair.address(),
        recipient_address: [0x99; 20],
        amount,
        nonce: 0,
        timestamp_ms: 1_700_000_000_000,
        sender_public_key: keypair.public_key(),
        signature: [0u8; 64],
        block_height: None,
    };
    tx.signature = keypair.sign(&tx.signing_hash()).unwrap();
    tx
}

/// A correctly signed achievement authored by `keypair`.
pub(crate) fn signed_achievement(keypair: &MeritKeyPair, edition: u64) -> Achievement {
    let mut achievement = Achievement {
        target_edition: edition,
        author_name: "author".to_string(),
        author_address: keypair.address(),
        description: "climbed a mountain".to_string(),
        attachment_ref: None,
        timestamp_ms: 1_700_000_000_000,
        author_public_key: keypair.public_key(),
        signature: [0u8; 64],
    };
    achievement.signature = keypair.sign(&achievement.signing_hash()).unwrap();
    achievement
}

/// A correctly signed review of `achievement` by `keypair`.
pub(crate) fn signed_review(
    keypair: &MeritKeyPair,
    achievement: &Achievement,
    overall: u8,
    timestamp_ms: u64,
) -> Review {
    let mut review = Review {
        target_edition: achievement.target_edition,
        achievement_signature: achievement.signature,
        reviewer_name: "reviewer".to_string(),
        reviewer_address: keypair.address(),
        scores: ReviewScores {
            overall,
            originality: 3,
            creativity: 3,
            relevance: 3,
            presentation: 3,
        },
        comment: "checked".to_string(),
        reviewer_public_key: keypair.public_key(),
        timestamp_ms,
        signature: [0u8; 64],
    };
    review.signature = keypair.sign(&review.signing_hash()).unwrap();
    review
}
