//! # Genesis Block
//!
//! The deterministic first block every participant derives from the
//! chain parameters alone: height 1, zero previous hash, commitments
//! over empty lists, timestamp equal to the genesis instant.

use mc_01_commitments::merkle_root;
use mc_02_state_trie::SparseAddressTrie;
use shared_types::{Block, BlockHeader, ChainParams, Signature, GENESIS_HEIGHT, GENESIS_PREVIOUS_HASH};

/// Build the genesis block for a chain.
pub fn genesis_block(params: &ChainParams) -> Block {
    let empty: Vec<Signature> = Vec::new();
    let empty_root = merkle_root(&empty);

    let mut header = BlockHeader {
        height: GENESIS_HEIGHT,
        previous_hash: GENESIS_PREVIOUS_HASH,
        accounts_root: SparseAddressTrie::new().root(),
        transactions_root: empty_root,
        achievements_root: empty_root,
        reviews_root: empty_root,
        transactions_count: 0,
        achievements_count: 0,
        reviews_count: 0,
        timestamp_ms: params.genesis_ms,
        hash: [0u8; 32],
    };
    header.hash = header.compute_hash();

    Block {
        header,
        transactions: vec![],
        achievements: vec![],
        reviews: vec![],
    }
}
