//! # Consensus Engine Service
//!
//! Owns the authoritative node state for the full role: the account
//! trie, the chain head, the per-edition pools, and the candidate
//! tracker. The runtime drives it with phase transitions and inbound
//! messages; the engine never touches the network itself, it only
//! returns the blocks the runtime should broadcast.

use crate::assembler::BlockAssembler;
use crate::error::ConsensusError;
use crate::genesis::genesis_block;
use crate::ledger::apply_block;
use crate::pools::EditionPools;
use crate::ports::LedgerStore;
use crate::selection::CandidateTracker;
use mc_02_state_trie::SparseAddressTrie;
use mc_03_validation::{
    verify_achievement, verify_review, verify_transaction, BlockValidator,
};
use shared_types::{
    Account, Achievement, Block, BlockHeader, ChainParams, Review, StoreError, Transaction,
    TrieProofStep, GENESIS_HEIGHT,
};
use std::sync::Arc;

/// The full-node consensus engine.
pub struct ConsensusEngine<S: LedgerStore> {
    store: Arc<S>,
    params: ChainParams,
    validator: BlockValidator,
    assembler: BlockAssembler,
    pools: EditionPools,
    tracker: CandidateTracker,
    ledger: SparseAddressTrie,
    head: BlockHeader,
    in_consensus: bool,
}

impl<S: LedgerStore> ConsensusEngine<S> {
    /// Load (or create) the chain and rebuild account state.
    ///
    /// An empty store gets the deterministic genesis block; a non-empty
    /// store is replayed from genesis to rebuild the trie.
    pub async fn bootstrap(store: Arc<S>, params: ChainParams) -> Result<Self, ConsensusError> {
        let mut ledger = SparseAddressTrie::new();

        let head = match store.latest_block().await? {
            Some(latest) => {
                let mut head = latest.header.clone();
                for height in GENESIS_HEIGHT..=latest.header.height {
                    let block = store.block(height).await?.ok_or_else(|| {
                        StoreError::NotFound(format!("block at height {height} during replay"))
                    })?;
                    apply_block(&mut ledger, &block, &params);
                    head = block.header.clone();
                }
                tracing::info!(height = head.height, "chain replayed from store");
                head
            }
            None => {
                let genesis = genesis_block(&params);
                store.add_block(&genesis).await?;
                tracing::info!(hash = %hex_prefix(&genesis.header.hash), "genesis block created");
                genesis.header
            }
        };

        Ok(Self {
            store,
            validator: BlockValidator::new(&params),
            assembler: BlockAssembler::new(params.clone()),
            params,
            pools: EditionPools::new(),
            tracker: CandidateTracker::new(),
            ledger,
            head,
            in_consensus: false,
        })
    }

    /// The current chain head header.
    pub fn head(&self) -> &BlockHeader {
        &self.head
    }

    /// The authoritative account trie.
    pub fn ledger(&self) -> &SparseAddressTrie {
        &self.ledger
    }

    /// The chain parameters this engine runs under.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Pending pool sizes as (transactions, achievements, reviews).
    pub fn pool_counts(&self) -> (usize, usize, usize) {
        self.pools.counts()
    }

    /// An account and its proof against the current accounts root.
    pub fn account_with_proof(
        &self,
        address: &shared_types::Address,
    ) -> (Option<Account>, Vec<TrieProofStep>) {
        self.ledger.get(address)
    }

    // === SUBMISSIONS ===

    /// Pool a pending transaction. Invalid or duplicate ones are dropped.
    pub fn submit_transaction(&mut self, tx: Transaction) -> bool {
        if !verify_transaction(&tx) {
            tracing::debug!("dropping transaction with bad signature");
            return false;
        }
        self.pools.add_transaction(tx)
    }

    /// Pool a pending achievement. Invalid or duplicate ones are dropped.
    pub fn submit_achievement(&mut self, achievement: Achievement) -> bool {
        if !verify_achievement(&achievement) {
            tracing::debug!("dropping achievement with bad signature");
            return false;
        }
        self.pools.add_achievement(achievement)
    }

    /// Pool a pending review. Invalid or duplicate ones are dropped.
    pub fn submit_review(&mut self, review: Review) -> bool {
        if !verify_review(&review) {
            tracing::debug!("dropping review with bad signature or scores");
            return false;
        }
        self.pools.add_review(review)
    }

    // === PHASE TRANSITIONS ===

    /// Submission phase opens: a fresh achievement set for this edition.
    pub fn on_submission_start(&mut self, edition: u64) {
        tracing::info!(edition, "submission phase: clearing pending achievements");
        self.pools.clear_achievements();
    }

    /// Review phase opens: a fresh review set for this edition.
    pub fn on_review_start(&mut self, edition: u64) {
        tracing::info!(edition, "review phase: clearing pending reviews");
        self.pools.clear_reviews();
    }

    /// Consensus phase opens: assemble and hold our candidate.
    ///
    /// Returns the candidate for the runtime to start re-broadcasting.
    pub fn on_consensus_start(&mut self, now_ms: u64) -> Block {
        self.in_consensus = true;
        self.tracker.reset();

        let candidate = self
            .assembler
            .assemble(&self.head, &self.pools, &self.ledger, now_ms);
        self.tracker.set_local(candidate.clone());
        candidate
    }

    /// A peer's candidate arrived. Returns the newly held candidate when
    /// the peer's one was adopted (the runtime re-broadcasts it).
    ///
    /// Outside the Consensus phase, and for any invalid, stale, or
    /// not-strictly-larger candidate, this is a silent no-op.
    pub fn on_peer_candidate(&mut self, candidate: Block) -> Option<&Block> {
        if !self.in_consensus {
            tracing::debug!("candidate outside consensus phase, ignoring");
            return None;
        }
        if candidate.header.height != self.head.height + 1
            || candidate.header.previous_hash != self.head.hash
        {
            tracing::debug!(
                height = candidate.header.height,
                "candidate does not extend our head, ignoring"
            );
            return None;
        }
        if !self.validator.verify(&candidate) {
            return None;
        }

        if self.tracker.consider(candidate) {
            self.tracker.local()
        } else {
            None
        }
    }

    /// Announcement phase opens: finalize the held candidate.
    ///
    /// All per-edition pools are cleared regardless of outcome. A store
    /// failure aborts finalization for this edition and surfaces as an
    /// error for the operator log; the engine itself stays healthy.
    pub async fn on_announcement_start(&mut self) -> Result<Option<Block>, ConsensusError> {
        self.in_consensus = false;
        self.pools.clear_all();

        let Some(block) = self.tracker.take_local() else {
            tracing::warn!("no candidate held at announcement; skipping this edition");
            self.tracker.reset();
            return Ok(None);
        };
        self.tracker.reset();

        // The head may have advanced already (a peer's finalized block
        // arrived first); a stale candidate is simply dropped.
        if block.header.height != self.head.height + 1
            || block.header.previous_hash != self.head.hash
        {
            tracing::debug!(
                candidate_height = block.header.height,
                head_height = self.head.height,
                "held candidate no longer extends the head; dropping"
            );
            return Ok(None);
        }

        self.store.add_block(&block).await?;
        apply_block(&mut self.ledger, &block, &self.params);
        self.head = block.header.clone();

        tracing::info!(
            height = block.header.height,
            entries = block.total_entries(),
            hash = %hex_prefix(&block.header.hash),
            "finalized block"
        );
        Ok(Some(block))
    }

    /// Adopt a finalized block announced by a peer (e.g. when this node
    /// held no candidate). Accepted only when it extends our head by
    /// exactly one and fully verifies.
    pub async fn accept_finalized_block(&mut self, block: Block) -> Result<bool, ConsensusError> {
        if block.header.height != self.head.height + 1
            || block.header.previous_hash != self.head.hash
        {
            tracing::debug!(
                height = block.header.height,
                "peer block does not extend our head, ignoring"
            );
            return Ok(false);
        }
        if !self.validator.verify(&block) {
            return Ok(false);
        }

        self.store.add_block(&block).await?;
        apply_block(&mut self.ledger, &block, &self.params);
        self.head = block.header.clone();
        tracing::info!(height = self.head.height, "adopted peer-finalized block");
        Ok(true)
    }
}

fn hex_prefix(hash: &shared_types::Hash) -> String {
    hash.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_crypto::MeritKeyPair;
    use shared_types::Signature;
    use std::collections::HashMap;

    /// Minimal in-memory store for engine tests.
    #[derive(Default)]
    struct TestStore {
        blocks: Mutex<HashMap<u64, Block>>,
        fail_writes: Mutex<bool>,
    }

    #[async_trait]
    impl LedgerStore for TestStore {
        async fn add_block(&self, block: &Block) -> Result<(), StoreError> {
            if *self.fail_writes.lock() {
                return Err(StoreError::Unavailable("test outage".into()));
            }
            self.blocks.lock().insert(block.header.height, block.clone());
            Ok(())
        }

        async fn latest_block(&self) -> Result<Option<Block>, StoreError> {
            let blocks = self.blocks.lock();
            Ok(blocks.keys().max().and_then(|h| blocks.get(h)).cloned())
        }

        async fn block_header(&self, height: u64) -> Result<Option<BlockHeader>, StoreError> {
            Ok(self.blocks.lock().get(&height).map(|b| b.header.clone()))
        }

        async fn block_headers(
            &self,
            from_height: u64,
            limit: u64,
        ) -> Result<Vec<BlockHeader>, StoreError> {
            let blocks = self.blocks.lock();
            Ok((from_height..from_height + limit)
                .filter_map(|h| blocks.get(&h).map(|b| b.header.clone()))
                .collect())
        }

        async fn block(&self, height: u64) -> Result<Option<Block>, StoreError> {
            Ok(self.blocks.lock().get(&height).cloned())
        }

        async fn blocks(&self, from_height: u64, limit: u64) -> Result<Vec<Block>, StoreError> {
            let blocks = self.blocks.lock();
            Ok((from_height..from_height + limit)
                .filter_map(|h| blocks.get(&h).cloned())
                .collect())
        }

        async fn add_transaction(&self, _tx: &Transaction) -> Result<(), StoreError> {
            Ok(())
        }

        async fn transaction(
            &self,
            _signature: &Signature,
        ) -> Result<Option<Transaction>, StoreError> {
            Ok(None)
        }

        async fn transactions_in_block(
            &self,
            height: u64,
        ) -> Result<Vec<Transaction>, StoreError> {
            Ok(self
                .blocks
                .lock()
                .get(&height)
                .map(|b| b.transactions.clone())
                .unwrap_or_default())
        }

        async fn add_achievement(&self, _achievement: &Achievement) -> Result<(), StoreError> {
            Ok(())
        }

        async fn achievement(
            &self,
            _signature: &Signature,
        ) -> Result<Option<Achievement>, StoreError> {
            Ok(None)
        }

        async fn achievements_in_block(
            &self,
            height: u64,
        ) -> Result<Vec<Achievement>, StoreError> {
            Ok(self
                .blocks
                .lock()
                .get(&height)
                .map(|b| b.achievements.clone())
                .unwrap_or_default())
        }

        async fn add_review(&self, _review: &Review) -> Result<(), StoreError> {
            Ok(())
        }

        async fn review(&self, _signature: &Signature) -> Result<Option<Review>, StoreError> {
            Ok(None)
        }

        async fn reviews_for_achievement(
            &self,
            _achievement_signature: &Signature,
        ) -> Result<Vec<Review>, StoreError> {
            Ok(vec![])
        }
    }

    fn signed_transaction(keypair: &MeritKeyPair, timestamp_ms: u64) -> Transaction {
        let mut tx = Transaction {
            sender_address: keypair.address(),
            recipient_address: [0x99; 20],
            amount: 1,
            nonce: 0,
            timestamp_ms,
            sender_public_key: keypair.public_key(),
            signature: [0u8; 64],
            block_height: None,
        };
        tx.signature = keypair.sign(&tx.signing_hash()).unwrap();
        tx
    }

    #[tokio::test]
    async fn test_bootstrap_creates_genesis() {
        let store = Arc::new(TestStore::default());
        let engine = ConsensusEngine::bootstrap(store.clone(), ChainParams::for_testing())
            .await
            .unwrap();

        assert_eq!(engine.head().height, GENESIS_HEIGHT);
        assert!(store.blocks.lock().contains_key(&GENESIS_HEIGHT));
    }

    #[tokio::test]
    async fn test_edition_cycle_finalizes_candidate() {
        let store = Arc::new(TestStore::default());
        let mut engine = ConsensusEngine::bootstrap(store.clone(), ChainParams::for_testing())
            .await
            .unwrap();

        engine.on_submission_start(0);
        let sender = MeritKeyPair::generate();
        assert!(engine.submit_transaction(signed_transaction(&sender, 1)));

        engine.on_review_start(0);
        let candidate = engine.on_consensus_start(700);
        assert_eq!(candidate.total_entries(), 1);

        let finalized = engine.on_announcement_start().await.unwrap().unwrap();
        assert_eq!(finalized.header.height, GENESIS_HEIGHT + 1);
        assert_eq!(engine.head().height, GENESIS_HEIGHT + 1);
        assert_eq!(engine.pool_counts(), (0, 0, 0));

        // The sender's account was touched.
        let (account, proof) = engine.account_with_proof(&sender.address());
        assert_eq!(account.unwrap().nonce, 1);
        assert!(!proof.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submission_dropped() {
        let store = Arc::new(TestStore::default());
        let mut engine = ConsensusEngine::bootstrap(store, ChainParams::for_testing())
            .await
            .unwrap();

        let mut tx = signed_transaction(&MeritKeyPair::generate(), 1);
        tx.amount += 1;
        assert!(!engine.submit_transaction(tx));
        assert_eq!(engine.pool_counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_candidate_outside_consensus_ignored() {
        let store = Arc::new(TestStore::default());
        let mut engine = ConsensusEngine::bootstrap(store, ChainParams::for_testing())
            .await
            .unwrap();

        let candidate = engine.assembler.assemble(
            &engine.head().clone(),
            &EditionPools::new(),
            &SparseAddressTrie::new(),
            700,
        );
        assert!(engine.on_peer_candidate(candidate).is_none());
    }

    #[tokio::test]
    async fn test_invalid_candidate_never_selected_even_if_larger() {
        let store = Arc::new(TestStore::default());
        let mut engine = ConsensusEngine::bootstrap(store, ChainParams::for_testing())
            .await
            .unwrap();

        // Local candidate: empty. Peer candidate: one transaction whose
        // signature was tampered after the roots were committed.
        engine.on_consensus_start(700);

        let mut tx = signed_transaction(&MeritKeyPair::generate(), 1);
        tx.amount += 1; // invalidates the signature
        tx.block_height = Some(engine.head().height + 1);

        let mut header = BlockHeader {
            height: engine.head().height + 1,
            previous_hash: engine.head().hash,
            transactions_root: mc_01_commitments::merkle_root(&[tx.signature]),
            achievements_root: mc_01_commitments::merkle_root(&Vec::<Signature>::new()),
            reviews_root: mc_01_commitments::merkle_root(&Vec::<Signature>::new()),
            transactions_count: 1,
            timestamp_ms: 750,
            ..BlockHeader::default()
        };
        header.hash = header.compute_hash();
        let forged = Block {
            header,
            transactions: vec![tx],
            achievements: vec![],
            reviews: vec![],
        };

        assert!(engine.on_peer_candidate(forged).is_none());
        // The empty local candidate survives and finalizes.
        let finalized = engine.on_announcement_start().await.unwrap().unwrap();
        assert_eq!(finalized.total_entries(), 0);
    }

    #[tokio::test]
    async fn test_store_outage_skips_edition_but_keeps_engine_alive() {
        let store = Arc::new(TestStore::default());
        let mut engine = ConsensusEngine::bootstrap(store.clone(), ChainParams::for_testing())
            .await
            .unwrap();

        engine.on_consensus_start(700);
        *store.fail_writes.lock() = true;
        assert!(engine.on_announcement_start().await.is_err());

        // Head unchanged; next edition proceeds normally.
        assert_eq!(engine.head().height, GENESIS_HEIGHT);
        *store.fail_writes.lock() = false;
        engine.on_consensus_start(1700);
        let finalized = engine.on_announcement_start().await.unwrap();
        assert!(finalized.is_some());
    }

    #[tokio::test]
    async fn test_restart_replays_chain() {
        let store = Arc::new(TestStore::default());
        let sender = MeritKeyPair::generate();

        {
            let mut engine =
                ConsensusEngine::bootstrap(store.clone(), ChainParams::for_testing())
                    .await
                    .unwrap();
            engine.submit_transaction(signed_transaction(&sender, 1));
            engine.on_consensus_start(700);
            engine.on_announcement_start().await.unwrap();
        }

        let restarted = ConsensusEngine::bootstrap(store, ChainParams::for_testing())
            .await
            .unwrap();
        assert_eq!(restarted.head().height, GENESIS_HEIGHT + 1);
        assert_eq!(
            restarted.ledger().account(&sender.address()).unwrap().nonce,
            1
        );
    }
}
