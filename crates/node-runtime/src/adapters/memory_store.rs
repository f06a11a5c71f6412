//! # In-Memory Ledger Store
//!
//! The reference [`LedgerStore`] adapter: blocks by height plus
//! signature-keyed entity indices, guarded by a read-write lock. Durable
//! backends implement the same trait out of tree.

use async_trait::async_trait;
use mc_05_consensus::LedgerStore;
use parking_lot::RwLock;
use shared_types::{
    Achievement, Block, BlockHeader, Review, Signature, StoreError, Transaction,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    blocks: BTreeMap<u64, Block>,
    transactions: HashMap<Signature, Transaction>,
    achievements: HashMap<Signature, Achievement>,
    reviews: HashMap<Signature, Review>,
}

/// Lock-guarded in-memory repository.
#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl MemoryLedgerStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn add_block(&self, block: &Block) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        if let Some((&tip, _)) = inner.blocks.last_key_value() {
            if block.header.height != tip + 1 {
                return Err(StoreError::NotSequential {
                    height: block.header.height,
                });
            }
        }

        // Index the block's entities alongside the block itself.
        for tx in &block.transactions {
            inner.transactions.insert(tx.signature, tx.clone());
        }
        for achievement in &block.achievements {
            inner
                .achievements
                .insert(achievement.signature, achievement.clone());
        }
        for review in &block.reviews {
            inner.reviews.insert(review.signature, review.clone());
        }
        inner.blocks.insert(block.header.height, block.clone());
        Ok(())
    }

    async fn latest_block(&self) -> Result<Option<Block>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .last_key_value()
            .map(|(_, block)| block.clone()))
    }

    async fn block_header(&self, height: u64) -> Result<Option<BlockHeader>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .get(&height)
            .map(|b| b.header.clone()))
    }

    async fn block_headers(
        &self,
        from_height: u64,
        limit: u64,
    ) -> Result<Vec<BlockHeader>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .range(from_height..)
            .take(limit as usize)
            .map(|(_, b)| b.header.clone())
            .collect())
    }

    async fn block(&self, height: u64) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.read().blocks.get(&height).cloned())
    }

    async fn blocks(&self, from_height: u64, limit: u64) -> Result<Vec<Block>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .range(from_height..)
            .take(limit as usize)
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn add_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        self.inner
            .write()
            .transactions
            .insert(tx.signature, tx.clone());
        Ok(())
    }

    async fn transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self.inner.read().transactions.get(signature).cloned())
    }

    async fn transactions_in_block(&self, height: u64) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .get(&height)
            .map(|b| b.transactions.clone())
            .unwrap_or_default())
    }

    async fn add_achievement(&self, achievement: &Achievement) -> Result<(), StoreError> {
        self.inner
            .write()
            .achievements
            .insert(achievement.signature, achievement.clone());
        Ok(())
    }

    async fn achievement(
        &self,
        signature: &Signature,
    ) -> Result<Option<Achievement>, StoreError> {
        Ok(self.inner.read().achievements.get(signature).cloned())
    }

    async fn achievements_in_block(&self, height: u64) -> Result<Vec<Achievement>, StoreError> {
        Ok(self
            .inner
            .read()
            .blocks
            .get(&height)
            .map(|b| b.achievements.clone())
            .unwrap_or_default())
    }

    async fn add_review(&self, review: &Review) -> Result<(), StoreError> {
        self.inner
            .write()
            .reviews
            .insert(review.signature, review.clone());
        Ok(())
    }

    async fn review(&self, signature: &Signature) -> Result<Option<Review>, StoreError> {
        Ok(self.inner.read().reviews.get(signature).cloned())
    }

    async fn reviews_for_achievement(
        &self,
        achievement_signature: &Signature,
    ) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .inner
            .read()
            .reviews
            .values()
            .filter(|r| r.achievement_signature == *achievement_signature)
            .cloned()
            .collect())
    }
}
