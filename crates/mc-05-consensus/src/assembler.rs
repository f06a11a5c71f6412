//! # Candidate Assembly
//!
//! Builds the candidate block for the Consensus phase: every pending
//! transaction, every achievement currently passing the acceptance rule,
//! and exactly the reviews that belong to those achievements. Account
//! effects run on a scratch copy of the trie to produce `accounts_root`
//! without touching authoritative state.
//!
//! Entity lists are ordered by (timestamp, signature) so two nodes
//! assembling from identical pools produce identical blocks.

use crate::ledger::apply_block;
use crate::pools::EditionPools;
use mc_01_commitments::merkle_root;
use mc_02_state_trie::SparseAddressTrie;
use mc_03_validation::accepted_achievement_signatures;
use shared_types::{Block, BlockHeader, ChainParams, Signature};
use std::collections::HashSet;

/// Stateless candidate assembler configured with the chain parameters.
#[derive(Debug, Clone)]
pub struct BlockAssembler {
    params: ChainParams,
}

impl BlockAssembler {
    /// Build an assembler.
    pub fn new(params: ChainParams) -> Self {
        Self { params }
    }

    /// Assemble the candidate extending `parent`.
    ///
    /// The result may be empty of entries; it is still a well-formed
    /// block that chains to the head.
    pub fn assemble(
        &self,
        parent: &BlockHeader,
        pools: &EditionPools,
        ledger: &SparseAddressTrie,
        now_ms: u64,
    ) -> Block {
        let height = parent.height + 1;

        let reviews_pool = pools.reviews();
        let accepted = accepted_achievement_signatures(
            &reviews_pool,
            self.params.min_reviewers_per_achievement,
            self.params.accept_threshold,
        );

        let mut achievements: Vec<_> = pools
            .achievements()
            .filter(|a| accepted.contains(&a.signature))
            .cloned()
            .collect();
        achievements.sort_by_key(|a| (a.timestamp_ms, a.signature));

        let included: HashSet<Signature> = achievements.iter().map(|a| a.signature).collect();
        let mut reviews: Vec<_> = reviews_pool
            .into_iter()
            .filter(|r| included.contains(&r.achievement_signature))
            .collect();
        reviews.sort_by_key(|r| (r.timestamp_ms, r.signature));

        let mut transactions: Vec<_> = pools.transactions().cloned().collect();
        transactions.sort_by_key(|t| (t.timestamp_ms, t.signature));
        for tx in &mut transactions {
            // Inclusion stamps the height; content (and signature) is untouched.
            tx.block_height = Some(height);
        }

        let mut body = Block {
            header: BlockHeader::default(),
            transactions,
            achievements,
            reviews,
        };

        let mut scratch = ledger.clone();
        apply_block(&mut scratch, &body, &self.params);

        let tx_sigs: Vec<Signature> = body.transactions.iter().map(|t| t.signature).collect();
        let ach_sigs: Vec<Signature> = body.achievements.iter().map(|a| a.signature).collect();
        let rev_sigs: Vec<Signature> = body.reviews.iter().map(|r| r.signature).collect();

        let mut header = BlockHeader {
            height,
            previous_hash: parent.hash,
            accounts_root: scratch.root(),
            transactions_root: merkle_root(&tx_sigs),
            achievements_root: merkle_root(&ach_sigs),
            reviews_root: merkle_root(&rev_sigs),
            transactions_count: body.transactions.len() as u64,
            achievements_count: body.achievements.len() as u64,
            reviews_count: body.reviews.len() as u64,
            timestamp_ms: now_ms,
            hash: [0u8; 32],
        };
        header.hash = header.compute_hash();
        body.header = header;

        tracing::info!(
            height,
            transactions = body.transactions.len(),
            achievements = body.achievements.len(),
            reviews = body.reviews.len(),
            "assembled candidate block"
        );

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::genesis_block;
    use mc_03_validation::BlockValidator;
    use shared_crypto::MeritKeyPair;
    use shared_types::{Achievement, Review, ReviewScores, Transaction};

    fn signed_achievement(keypair: &MeritKeyPair) -> Achievement {
        let mut a = Achievement {
            target_edition: 0,
            author_name: "author".into(),
            author_address: keypair.address(),
            description: "built a telescope".into(),
            attachment_ref: None,
            timestamp_ms: 100,
            author_public_key: keypair.public_key(),
            signature: [0u8; 64],
        };
        a.signature = keypair.sign(&a.signing_hash()).unwrap();
        a
    }

    fn signed_review(keypair: &MeritKeyPair, of: &Achievement, overall: u8) -> Review {
        let mut r = Review {
            target_edition: of.target_edition,
            achievement_signature: of.signature,
            reviewer_name: "reviewer".into(),
            reviewer_address: keypair.address(),
            scores: ReviewScores {
                overall,
                originality: 3,
                creativity: 3,
                relevance: 3,
                presentation: 3,
            },
            comment: "ok".into(),
            reviewer_public_key: keypair.public_key(),
            timestamp_ms: 200,
            signature: [0u8; 64],
        };
        r.signature = keypair.sign(&r.signing_hash()).unwrap();
        r
    }

    fn signed_transaction(keypair: &MeritKeyPair) -> Transaction {
        let mut t = Transaction {
            sender_address: keypair.address(),
            recipient_address: [0x99; 20],
            amount: 5,
            nonce: 0,
            timestamp_ms: 50,
            sender_public_key: keypair.public_key(),
            signature: [0u8; 64],
            block_height: None,
        };
        t.signature = keypair.sign(&t.signing_hash()).unwrap();
        t
    }

    #[test]
    fn test_assembled_candidate_verifies() {
        let params = ChainParams::for_testing();
        let genesis = genesis_block(&params);
        let ledger = SparseAddressTrie::new();

        let author = MeritKeyPair::generate();
        let reviewer = MeritKeyPair::generate();
        let sender = MeritKeyPair::generate();

        let achievement = signed_achievement(&author);
        let review = signed_review(&reviewer, &achievement, 4);

        let mut pools = EditionPools::new();
        pools.add_transaction(signed_transaction(&sender));
        pools.add_achievement(achievement.clone());
        pools.add_review(review);

        let candidate =
            BlockAssembler::new(params.clone()).assemble(&genesis.header, &pools, &ledger, 500);

        assert_eq!(candidate.header.height, genesis.header.height + 1);
        assert_eq!(candidate.header.previous_hash, genesis.header.hash);
        assert_eq!(candidate.total_entries(), 3);
        assert!(BlockValidator::new(&params).verify(&candidate));
        assert_eq!(candidate.transactions[0].block_height, Some(2));
    }

    #[test]
    fn test_unreviewed_achievement_left_out() {
        let params = ChainParams::for_testing();
        let genesis = genesis_block(&params);
        let ledger = SparseAddressTrie::new();

        let mut pools = EditionPools::new();
        pools.add_achievement(signed_achievement(&MeritKeyPair::generate()));

        let candidate =
            BlockAssembler::new(params.clone()).assemble(&genesis.header, &pools, &ledger, 500);
        assert!(candidate.achievements.is_empty());
        assert!(BlockValidator::new(&params).verify(&candidate));
    }

    #[test]
    fn test_rejected_achievements_reviews_left_out() {
        let params = ChainParams::for_testing();
        let genesis = genesis_block(&params);
        let ledger = SparseAddressTrie::new();

        let author = MeritKeyPair::generate();
        let achievement = signed_achievement(&author);
        // Below threshold: achievement and its reviews stay out.
        let review = signed_review(&MeritKeyPair::generate(), &achievement, 1);

        let mut pools = EditionPools::new();
        pools.add_achievement(achievement);
        pools.add_review(review);

        let candidate =
            BlockAssembler::new(params.clone()).assemble(&genesis.header, &pools, &ledger, 500);
        assert!(candidate.achievements.is_empty());
        assert!(candidate.reviews.is_empty());
    }

    #[test]
    fn test_accounts_root_reflects_rewards() {
        let params = ChainParams::for_testing();
        let genesis = genesis_block(&params);
        let ledger = SparseAddressTrie::new();

        let author = MeritKeyPair::generate();
        let achievement = signed_achievement(&author);
        let review = signed_review(&MeritKeyPair::generate(), &achievement, 5);

        let mut pools = EditionPools::new();
        pools.add_achievement(achievement);
        pools.add_review(review);

        let candidate =
            BlockAssembler::new(params.clone()).assemble(&genesis.header, &pools, &ledger, 500);

        // Replaying the block on the same ledger reproduces the root.
        let mut replay = ledger.clone();
        apply_block(&mut replay, &candidate, &params);
        assert_eq!(candidate.header.accounts_root, replay.root());
        assert_ne!(candidate.header.accounts_root, ledger.root());
    }
}
