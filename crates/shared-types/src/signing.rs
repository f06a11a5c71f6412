//! # Signing Preimages
//!
//! Every entity signature covers the Keccak-256 hash of a fixed,
//! field-order-sensitive preimage string. The rendering below is
//! consistency-critical: all nodes must produce bit-identical preimages.
//!
//! ## Rendering rules
//!
//! - Fields are joined with a single `_` separator, in the exact order
//!   listed per entity.
//! - Strings render verbatim; an absent optional string renders empty.
//! - Unsigned integers render base-10 with no padding.
//! - Timestamps render as base-10 milliseconds since the Unix epoch.
//! - Hashes, public keys, and signatures render as lowercase hex, no prefix.
//! - Addresses render in their checksum-cased display form (`0x`-prefixed).
//! - Roles render as `light` / `full`.

use crate::entities::{
    Account, Achievement, Address, BlockHeader, ChainHead, Hash, Identity, Review, Transaction,
};
use shared_crypto::{keccak256, to_checksum_hex};

/// Separator between preimage fields.
pub const FIELD_SEPARATOR: &str = "_";

/// Join pre-rendered fields and hash the result.
pub fn hash_joined_fields(fields: &[String]) -> Hash {
    keccak256(fields.join(FIELD_SEPARATOR).as_bytes())
}

fn bytes_field(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

fn address_field(address: &Address) -> String {
    to_checksum_hex(address)
}

impl Identity {
    /// Hash of (chain_id, display_name, address, role, public_key).
    pub fn signing_hash(&self) -> Hash {
        hash_joined_fields(&[
            self.chain_id.clone(),
            self.display_name.clone(),
            address_field(&self.address),
            self.role.as_str().to_string(),
            bytes_field(&self.public_key),
        ])
    }
}

impl Transaction {
    /// Hash of (sender, recipient, amount, timestamp, sender public key).
    ///
    /// Neither `nonce` nor `block_height` is covered: re-submission after
    /// inclusion updates `block_height` without invalidating the signature.
    pub fn signing_hash(&self) -> Hash {
        hash_joined_fields(&[
            address_field(&self.sender_address),
            address_field(&self.recipient_address),
            self.amount.to_string(),
            self.timestamp_ms.to_string(),
            bytes_field(&self.sender_public_key),
        ])
    }
}

impl Achievement {
    /// Hash of every field except the signature itself.
    pub fn signing_hash(&self) -> Hash {
        hash_joined_fields(&[
            self.target_edition.to_string(),
            self.author_name.clone(),
            address_field(&self.author_address),
            self.description.clone(),
            self.attachment_ref.clone().unwrap_or_default(),
            self.timestamp_ms.to_string(),
            bytes_field(&self.author_public_key),
        ])
    }
}

impl Review {
    /// Hash of every field except the signature itself.
    ///
    /// Scores render in the fixed order overall, originality, creativity,
    /// relevance, presentation.
    pub fn signing_hash(&self) -> Hash {
        let mut fields = vec![
            self.target_edition.to_string(),
            bytes_field(&self.achievement_signature),
            self.reviewer_name.clone(),
            address_field(&self.reviewer_address),
        ];
        fields.extend(self.scores.as_array().iter().map(|s| s.to_string()));
        fields.push(self.comment.clone());
        fields.push(bytes_field(&self.reviewer_public_key));
        fields.push(self.timestamp_ms.to_string());
        hash_joined_fields(&fields)
    }
}

impl Account {
    /// Hash of every account field, used as the trie leaf hash.
    pub fn state_hash(&self) -> Hash {
        hash_joined_fields(&[
            address_field(&self.address),
            self.balance.to_string(),
            self.nonce.to_string(),
            self.accepted_achievement_count.to_string(),
            self.included_review_count.to_string(),
        ])
    }
}

impl BlockHeader {
    /// Recompute the header hash from its own fields.
    ///
    /// `Keccak256(previous_hash ∥ roots ∥ counts ∥ timestamp)` under the
    /// preimage rendering above. The stored `hash` field must equal this.
    pub fn compute_hash(&self) -> Hash {
        hash_joined_fields(&[
            bytes_field(&self.previous_hash),
            bytes_field(&self.accounts_root),
            bytes_field(&self.transactions_root),
            bytes_field(&self.achievements_root),
            bytes_field(&self.reviews_root),
            self.transactions_count.to_string(),
            self.achievements_count.to_string(),
            self.reviews_count.to_string(),
            self.timestamp_ms.to_string(),
        ])
    }
}

impl ChainHead {
    /// Hash of (height, hash, publisher address).
    pub fn signing_hash(&self) -> Hash {
        hash_joined_fields(&[
            self.height.to_string(),
            bytes_field(&self.hash),
            address_field(&self.publisher_address),
        ])
    }
}
