//! # Core Domain Entities
//!
//! Defines the core ledger entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Identity & State**: `Identity`, `Account`
//! - **Submissions**: `Transaction`, `Achievement`, `Review`
//! - **Chain**: `BlockHeader`, `Block`, `ChainHead`
//!
//! Every signed entity embeds its public key and signature; the signing
//! preimage conventions live in [`crate::signing`].

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte ECDSA signature (r||s).
pub type Signature = [u8; 64];

/// A 33-byte compressed secp256k1 public key.
pub type PublicKey = [u8; 33];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Height of the genesis block. Network-wide constant.
pub const GENESIS_HEIGHT: u64 = 1;

/// Previous-hash field of the genesis block header.
pub const GENESIS_PREVIOUS_HASH: Hash = [0u8; 32];

/// The role a node plays on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Syncs headers/blocks from full nodes; does not assemble candidates.
    Light,
    /// Authoritative participant: assembles, selects, and finalizes blocks.
    Full,
}

impl NodeRole {
    /// Canonical lowercase rendering (also used in signing preimages).
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Light => "light",
            NodeRole::Full => "full",
        }
    }
}

/// A network participant's self-signed identity.
///
/// Immutable once created; lives for the process lifetime of a node.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// The chain this identity participates in.
    pub chain_id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Address derived from `public_key`.
    pub address: Address,
    /// Role announced to peers.
    pub role: NodeRole,
    /// The holder's public key.
    #[serde_as(as = "Bytes")]
    pub public_key: PublicKey,
    /// Signature over (chain_id, display_name, address, role, public_key).
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// The state of an account, stored in the sparse address trie.
///
/// Created lazily on first credit; mutated only by block finalization;
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// The account address.
    pub address: Address,
    /// Balance in base units.
    pub balance: u64,
    /// Number of transactions sent from this account.
    pub nonce: u64,
    /// Achievements by this account accepted into finalized blocks.
    pub accepted_achievement_count: u64,
    /// Reviews by this account included in finalized blocks.
    pub included_review_count: u64,
}

impl Account {
    /// A fresh zero-balance account.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }
}

/// A value transfer between accounts.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub sender_address: Address,
    /// Recipient address.
    pub recipient_address: Address,
    /// Amount in base units.
    pub amount: u64,
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Sender's public key.
    #[serde_as(as = "Bytes")]
    pub sender_public_key: PublicKey,
    /// Signature over (sender, recipient, amount, timestamp, public key).
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    /// `None` while pending; the including block's height once finalized.
    /// Inclusion updates only this field, never content.
    pub block_height: Option<u64>,
}

/// A claimed real-world accomplishment, subject to peer review.
///
/// The signature doubles as the achievement's content address: reviews
/// reference it, and the Merkle commitment is built over it.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// The edition this achievement was submitted for.
    pub target_edition: u64,
    /// Author display name.
    pub author_name: String,
    /// Author address.
    pub author_address: Address,
    /// Free-text description of the accomplishment.
    pub description: String,
    /// Optional reference to supporting material held outside the ledger.
    pub attachment_ref: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Author's public key.
    #[serde_as(as = "Bytes")]
    pub author_public_key: PublicKey,
    /// Signature over every other field.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// The five review score axes, each an integer in [0, 5].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewScores {
    /// Overall assessment; this axis drives block acceptance.
    pub overall: u8,
    /// Originality of the accomplishment.
    pub originality: u8,
    /// Creativity shown.
    pub creativity: u8,
    /// Relevance or difficulty.
    pub relevance: u8,
    /// Quality of the write-up.
    pub presentation: u8,
}

/// Maximum value of any single review score.
pub const MAX_SCORE: u8 = 5;

impl ReviewScores {
    /// All five axes in canonical preimage order.
    pub fn as_array(&self) -> [u8; 5] {
        [
            self.overall,
            self.originality,
            self.creativity,
            self.relevance,
            self.presentation,
        ]
    }

    /// Whether every axis lies in [0, MAX_SCORE].
    pub fn in_range(&self) -> bool {
        self.as_array().iter().all(|&s| s <= MAX_SCORE)
    }
}

/// A scored evaluation of an achievement by a distinct reviewer.
///
/// Multiple reviews per (achievement, reviewer) pair may exist; only the
/// most recent per reviewer counts toward acceptance.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// The edition of the reviewed achievement.
    pub target_edition: u64,
    /// Content address of the reviewed achievement.
    #[serde_as(as = "Bytes")]
    pub achievement_signature: Signature,
    /// Reviewer display name.
    pub reviewer_name: String,
    /// Reviewer address.
    pub reviewer_address: Address,
    /// The five score axes.
    pub scores: ReviewScores,
    /// Free-text commentary.
    pub comment: String,
    /// Reviewer's public key.
    #[serde_as(as = "Bytes")]
    pub reviewer_public_key: PublicKey,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Signature over every other field.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// The header of a block: chain linkage, commitments, and counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height; genesis is [`GENESIS_HEIGHT`].
    pub height: u64,
    /// Hash of the parent block header.
    pub previous_hash: Hash,
    /// Sparse address trie root after applying this block.
    pub accounts_root: Hash,
    /// Merkle commitment over the transactions' signatures.
    pub transactions_root: Hash,
    /// Merkle commitment over the achievements' signatures.
    pub achievements_root: Hash,
    /// Merkle commitment over the reviews' signatures.
    pub reviews_root: Hash,
    /// Number of transactions in the block body.
    pub transactions_count: u64,
    /// Number of achievements in the block body.
    pub achievements_count: u64,
    /// Number of reviews in the block body.
    pub reviews_count: u64,
    /// Assembly time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// `Keccak256(previous_hash ∥ roots ∥ counts ∥ timestamp)`.
    pub hash: Hash,
}

impl BlockHeader {
    /// Whether this header is the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.height == GENESIS_HEIGHT
    }

    /// Total entry count committed by the header.
    pub fn total_entries(&self) -> u64 {
        self.transactions_count + self.achievements_count + self.reviews_count
    }
}

/// A block: header plus the full ordered entity lists whose Merkle roots
/// match the header. Atomic: wholly accepted as the canonical height or
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Ordered transactions.
    pub transactions: Vec<Transaction>,
    /// Ordered achievements.
    pub achievements: Vec<Achievement>,
    /// Ordered reviews.
    pub reviews: Vec<Review>,
}

impl Block {
    /// Total entries actually carried in the body.
    ///
    /// Candidate selection compares candidates by this number; for a
    /// verified block it equals `header.total_entries()`.
    pub fn total_entries(&self) -> usize {
        self.transactions.len() + self.achievements.len() + self.reviews.len()
    }
}

/// The highest known finalized block, optionally signed by its publisher.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainHead {
    /// Height of the head block.
    pub height: u64,
    /// Header hash of the head block.
    pub hash: Hash,
    /// Address of the node announcing this head.
    pub publisher_address: Address,
    /// Publisher's public key, present when the announcement is signed.
    #[serde_as(as = "Option<Bytes>")]
    pub publisher_public_key: Option<PublicKey>,
    /// Publisher signature over (height, hash, publisher address).
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
}

/// One step of a sparse-address-trie proof, deepest step last.
///
/// Absent siblings are represented by the `Default` sentinel rather than
/// their hash, keeping account proofs compact on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrieProofStep {
    /// The sibling subtree at this level is present and has this hash.
    Sibling(Hash),
    /// The sibling subtree at this level is absent (default hash).
    Default,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_in_range() {
        let scores = ReviewScores {
            overall: 4,
            originality: 5,
            creativity: 0,
            relevance: 3,
            presentation: 2,
        };
        assert!(scores.in_range());
    }

    #[test]
    fn test_header_total_entries() {
        let header = BlockHeader {
            transactions_count: 2,
            achievements_count: 1,
            reviews_count: 3,
            ..BlockHeader::default()
        };
        assert_eq!(header.total_entries(), 6);
    }

    #[test]
    fn test_genesis_detection() {
        let header = BlockHeader {
            height: GENESIS_HEIGHT,
            ..BlockHeader::default()
        };
        assert!(header.is_genesis());
    }

    #[test]
    fn test_role_rendering() {
        assert_eq!(NodeRole::Light.as_str(), "light");
        assert_eq!(NodeRole::Full.as_str(), "full");
    }

    #[test]
    fn test_block_total_entries_matches_body() {
        let block = Block {
            header: BlockHeader::default(),
            transactions: vec![],
            achievements: vec![],
            reviews: vec![],
        };
        assert_eq!(block.total_entries(), 0);
    }
}
