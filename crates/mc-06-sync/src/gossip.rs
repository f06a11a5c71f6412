//! # Gossip Validation
//!
//! Unsolicited entities are checked for signature validity and
//! phase-appropriateness before touching node state: achievements only
//! during the Submission phase of their target edition, reviews only
//! during Review, candidates only during Consensus. Everything failing
//! here is dropped without error; inbound traffic is adversarial by
//! default.

use mc_03_validation::{
    verify_achievement, verify_chain_head, verify_review, verify_transaction,
};
use mc_04_phase_clock::{EditionStatus, Phase};
use shared_types::{Achievement, Block, BlockHeader, ChainHead, Review, Transaction};

/// Stateless gossip checks used by both node roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GossipValidator;

impl GossipValidator {
    /// A new validator.
    pub fn new() -> Self {
        Self
    }

    /// Transactions are accepted in any phase; only the signature matters.
    pub fn check_transaction(&self, tx: &Transaction) -> bool {
        verify_transaction(tx)
    }

    /// Achievements must arrive during Submission of their target edition.
    pub fn check_achievement(&self, achievement: &Achievement, status: &EditionStatus) -> bool {
        if status.phase != Phase::Submission || achievement.target_edition != status.edition {
            tracing::debug!(
                target = achievement.target_edition,
                edition = status.edition,
                phase = %status.phase,
                "achievement outside its submission window"
            );
            return false;
        }
        verify_achievement(achievement)
    }

    /// Reviews must arrive during Review of their target edition.
    pub fn check_review(&self, review: &Review, status: &EditionStatus) -> bool {
        if status.phase != Phase::Review || review.target_edition != status.edition {
            tracing::debug!(
                target = review.target_edition,
                edition = status.edition,
                phase = %status.phase,
                "review outside its review window"
            );
            return false;
        }
        verify_review(review)
    }

    /// Candidates only make sense during the Consensus phase; full
    /// verification happens in the engine.
    pub fn check_candidate_phase(&self, status: &EditionStatus) -> bool {
        status.phase == Phase::Consensus
    }

    /// A gossiped finalized block must extend the known head by exactly
    /// one height with a matching parent hash.
    pub fn check_block_extends(&self, block: &Block, head: &BlockHeader) -> bool {
        block.header.height == head.height + 1 && block.header.previous_hash == head.hash
    }

    /// Chain-head announcements: signature check when signed.
    pub fn check_chain_head(&self, head: &ChainHead) -> bool {
        verify_chain_head(head)
    }
}
