//! # Outbound Ports
//!
//! The storage boundary consumed by the engine (and by a full node when
//! serving sync requests). The core never embeds storage-engine types;
//! adapters implement this trait over whatever backend they like, and
//! any failure aborts only the calling operation.

use async_trait::async_trait;
use shared_types::{Achievement, Block, BlockHeader, Review, Signature, StoreError, Transaction};

/// Abstract ledger repository.
///
/// `add_block` persists the block and its entity lists atomically; the
/// per-entity `add_*` methods exist for pending-entity spillover and are
/// not required for finalization.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a finalized block (header plus entity lists).
    async fn add_block(&self, block: &Block) -> Result<(), StoreError>;

    /// The highest stored block, if any.
    async fn latest_block(&self) -> Result<Option<Block>, StoreError>;

    /// One header by height.
    async fn block_header(&self, height: u64) -> Result<Option<BlockHeader>, StoreError>;

    /// Headers from `from_height`, ascending, at most `limit`.
    async fn block_headers(
        &self,
        from_height: u64,
        limit: u64,
    ) -> Result<Vec<BlockHeader>, StoreError>;

    /// One full block by height.
    async fn block(&self, height: u64) -> Result<Option<Block>, StoreError>;

    /// Blocks from `from_height`, ascending, at most `limit`.
    async fn blocks(&self, from_height: u64, limit: u64) -> Result<Vec<Block>, StoreError>;

    /// Persist a single (pending) transaction.
    async fn add_transaction(&self, tx: &Transaction) -> Result<(), StoreError>;

    /// One transaction by signature.
    async fn transaction(&self, signature: &Signature)
        -> Result<Option<Transaction>, StoreError>;

    /// The transactions of a finalized block, in block order.
    async fn transactions_in_block(&self, height: u64) -> Result<Vec<Transaction>, StoreError>;

    /// Persist a single (pending) achievement.
    async fn add_achievement(&self, achievement: &Achievement) -> Result<(), StoreError>;

    /// One achievement by signature.
    async fn achievement(
        &self,
        signature: &Signature,
    ) -> Result<Option<Achievement>, StoreError>;

    /// The achievements of a finalized block, in block order.
    async fn achievements_in_block(&self, height: u64) -> Result<Vec<Achievement>, StoreError>;

    /// Persist a single (pending) review.
    async fn add_review(&self, review: &Review) -> Result<(), StoreError>;

    /// One review by signature.
    async fn review(&self, signature: &Signature) -> Result<Option<Review>, StoreError>;

    /// All stored reviews referencing an achievement.
    async fn reviews_for_achievement(
        &self,
        achievement_signature: &Signature,
    ) -> Result<Vec<Review>, StoreError>;
}
