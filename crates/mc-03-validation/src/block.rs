//! # Whole-Block Verification
//!
//! A block is atomic: any failed check rejects it entirely. The checks
//! compose header self-consistency, count/root agreement, per-entity
//! signatures, and the review-acceptance rule. The achievement set must
//! be exactly the set accepted by the block's own reviews, and every
//! carried review must reference an included achievement.

use crate::acceptance::accepted_achievement_signatures;
use crate::entity::{verify_achievement, verify_review, verify_transaction};
use mc_01_commitments::merkle_root;
use shared_types::{Block, BlockHeader, ChainParams, Signature};
use std::collections::HashSet;
use thiserror::Error;

/// Why a block was rejected. Used for logging only; inbound blocks are
/// dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockFlaw {
    /// The stored header hash does not recompute.
    #[error("header hash does not recompute")]
    HeaderHashMismatch,
    /// A count field disagrees with the corresponding list length.
    #[error("{list} count {declared} != actual length {actual}")]
    CountMismatch {
        /// Which list disagreed.
        list: &'static str,
        /// The header's count field.
        declared: u64,
        /// The body list's length.
        actual: u64,
    },
    /// A Merkle root does not recompute from the body list.
    #[error("{0} root does not recompute")]
    RootMismatch(&'static str),
    /// A transaction failed signature verification.
    #[error("invalid transaction at index {0}")]
    InvalidTransaction(usize),
    /// An achievement failed signature verification.
    #[error("invalid achievement at index {0}")]
    InvalidAchievement(usize),
    /// A review failed signature or score-range verification.
    #[error("invalid review at index {0}")]
    InvalidReview(usize),
    /// The same achievement appears twice.
    #[error("duplicate achievement in block")]
    DuplicateAchievement,
    /// The achievement set differs from the reviewed-and-accepted set.
    #[error("achievement set does not match the accepted set")]
    AcceptanceMismatch,
    /// A review references an achievement not carried by the block.
    #[error("review at index {0} references an achievement outside the block")]
    DanglingReview(usize),
}

/// Verify that a header's stored hash recomputes from its fields.
pub fn verify_block_header(header: &BlockHeader) -> bool {
    header.hash == header.compute_hash()
}

/// Stateless block validator configured with the chain's acceptance
/// parameters.
#[derive(Debug, Clone)]
pub struct BlockValidator {
    min_reviewers: usize,
    accept_threshold: u8,
}

impl BlockValidator {
    /// Build a validator from chain parameters.
    pub fn new(params: &ChainParams) -> Self {
        Self {
            min_reviewers: params.min_reviewers_per_achievement,
            accept_threshold: params.accept_threshold,
        }
    }

    /// Check a block, reporting the first flaw found.
    pub fn check(&self, block: &Block) -> Result<(), BlockFlaw> {
        let header = &block.header;

        if !verify_block_header(header) {
            return Err(BlockFlaw::HeaderHashMismatch);
        }

        check_count(
            "transactions",
            header.transactions_count,
            block.transactions.len(),
        )?;
        check_count(
            "achievements",
            header.achievements_count,
            block.achievements.len(),
        )?;
        check_count("reviews", header.reviews_count, block.reviews.len())?;

        let tx_signatures: Vec<Signature> =
            block.transactions.iter().map(|t| t.signature).collect();
        if merkle_root(&tx_signatures) != header.transactions_root {
            return Err(BlockFlaw::RootMismatch("transactions"));
        }
        let achievement_signatures: Vec<Signature> =
            block.achievements.iter().map(|a| a.signature).collect();
        if merkle_root(&achievement_signatures) != header.achievements_root {
            return Err(BlockFlaw::RootMismatch("achievements"));
        }
        let review_signatures: Vec<Signature> = block.reviews.iter().map(|r| r.signature).collect();
        if merkle_root(&review_signatures) != header.reviews_root {
            return Err(BlockFlaw::RootMismatch("reviews"));
        }

        for (i, tx) in block.transactions.iter().enumerate() {
            if !verify_transaction(tx) {
                return Err(BlockFlaw::InvalidTransaction(i));
            }
        }
        for (i, achievement) in block.achievements.iter().enumerate() {
            if !verify_achievement(achievement) {
                return Err(BlockFlaw::InvalidAchievement(i));
            }
        }
        for (i, review) in block.reviews.iter().enumerate() {
            if !verify_review(review) {
                return Err(BlockFlaw::InvalidReview(i));
            }
        }

        let included: HashSet<Signature> = achievement_signatures.iter().copied().collect();
        if included.len() != block.achievements.len() {
            return Err(BlockFlaw::DuplicateAchievement);
        }

        for (i, review) in block.reviews.iter().enumerate() {
            if !included.contains(&review.achievement_signature) {
                return Err(BlockFlaw::DanglingReview(i));
            }
        }

        let accepted = accepted_achievement_signatures(
            &block.reviews,
            self.min_reviewers,
            self.accept_threshold,
        );
        if accepted != included {
            return Err(BlockFlaw::AcceptanceMismatch);
        }

        Ok(())
    }

    /// Verify a block, logging the rejection reason at debug level.
    pub fn verify(&self, block: &Block) -> bool {
        match self.check(block) {
            Ok(()) => true,
            Err(flaw) => {
                tracing::debug!(height = block.header.height, %flaw, "rejecting block");
                false
            }
        }
    }
}

/// One-shot block verification against chain parameters.
pub fn verify_block(block: &Block, params: &ChainParams) -> bool {
    BlockValidator::new(params).verify(block)
}

fn check_count(list: &'static str, declared: u64, actual: usize) -> Result<(), BlockFlaw> {
    if declared != actual as u64 {
        return Err(BlockFlaw::CountMismatch {
            list,
            declared,
            actual: actual as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{signed_achievement, signed_review, signed_transaction};
    use shared_crypto::MeritKeyPair;
    use shared_types::{BlockHeader, GENESIS_PREVIOUS_HASH};

    /// Assemble a structurally valid block from signed entities.
    fn build_block(
        transactions: Vec<shared_types::Transaction>,
        achievements: Vec<shared_types::Achievement>,
        reviews: Vec<shared_types::Review>,
    ) -> Block {
        let tx_sigs: Vec<Signature> = transactions.iter().map(|t| t.signature).collect();
        let ach_sigs: Vec<Signature> = achievements.iter().map(|a| a.signature).collect();
        let rev_sigs: Vec<Signature> = reviews.iter().map(|r| r.signature).collect();

        let mut header = BlockHeader {
            height: 2,
            previous_hash: GENESIS_PREVIOUS_HASH,
            accounts_root: [0u8; 32],
            transactions_root: merkle_root(&tx_sigs),
            achievements_root: merkle_root(&ach_sigs),
            reviews_root: merkle_root(&rev_sigs),
            transactions_count: transactions.len() as u64,
            achievements_count: achievements.len() as u64,
            reviews_count: reviews.len() as u64,
            timestamp_ms: 1_700_000_000_000,
            hash: [0u8; 32],
        };
        header.hash = header.compute_hash();

        Block {
            header,
            transactions,
            achievements,
            reviews,
        }
    }

    fn params() -> ChainParams {
        ChainParams::for_testing()
    }

    fn reviewed_block() -> Block {
        let sender = MeritKeyPair::generate();
        let author = MeritKeyPair::generate();
        let reviewer = MeritKeyPair::generate();

        let achievement = signed_achievement(&author, 0);
        let review = signed_review(&reviewer, &achievement, 4, 50);
        build_block(
            vec![signed_transaction(&sender, 10)],
            vec![achievement],
            vec![review],
        )
    }

    #[test]
    fn test_valid_block_passes() {
        let validator = BlockValidator::new(&params());
        assert!(validator.verify(&reviewed_block()));
    }

    #[test]
    fn test_empty_block_passes() {
        let validator = BlockValidator::new(&params());
        assert!(validator.verify(&build_block(vec![], vec![], vec![])));
    }

    #[test]
    fn test_tampered_header_hash() {
        let mut block = reviewed_block();
        block.header.hash[0] ^= 0x01;
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::HeaderHashMismatch)
        );
    }

    #[test]
    fn test_count_disagreement() {
        let mut block = reviewed_block();
        block.header.transactions_count += 1;
        block.header.hash = block.header.compute_hash();
        assert!(matches!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_root() {
        let mut block = reviewed_block();
        block.header.reviews_root[0] ^= 0x01;
        block.header.hash = block.header.compute_hash();
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::RootMismatch("reviews"))
        );
    }

    #[test]
    fn test_tampered_transaction_signature() {
        let mut block = reviewed_block();
        block.transactions[0].signature[0] ^= 0x01;
        // Re-commit so the failure is the signature, not the root.
        let sigs: Vec<Signature> = block.transactions.iter().map(|t| t.signature).collect();
        block.header.transactions_root = merkle_root(&sigs);
        block.header.hash = block.header.compute_hash();
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::InvalidTransaction(0))
        );
    }

    #[test]
    fn test_unreviewed_achievement_rejected() {
        let author = MeritKeyPair::generate();
        let achievement = signed_achievement(&author, 0);
        let block = build_block(vec![], vec![achievement], vec![]);
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::AcceptanceMismatch)
        );
    }

    #[test]
    fn test_dangling_review_rejected() {
        let author = MeritKeyPair::generate();
        let reviewer = MeritKeyPair::generate();
        let achievement = signed_achievement(&author, 0);
        let review = signed_review(&reviewer, &achievement, 4, 50);
        // Review present, its achievement absent.
        let block = build_block(vec![], vec![], vec![review]);
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::DanglingReview(0))
        );
    }

    #[test]
    fn test_rejected_achievement_cannot_ride_along() {
        let author = MeritKeyPair::generate();
        let reviewer = MeritKeyPair::generate();
        let achievement = signed_achievement(&author, 0);
        // Median below threshold.
        let review = signed_review(&reviewer, &achievement, 1, 50);
        let block = build_block(vec![], vec![achievement], vec![review]);
        assert_eq!(
            BlockValidator::new(&params()).check(&block),
            Err(BlockFlaw::AcceptanceMismatch)
        );
    }
}
