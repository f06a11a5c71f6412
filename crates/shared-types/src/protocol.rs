//! # Relay Wire Protocol
//!
//! Every message carried between peers by the relay transport, as typed
//! payloads behind a tagged enum. Inbound traffic decodes through
//! [`WireMessage`] before any typed code sees it; undecodable messages
//! fail closed at the adapter boundary.
//!
//! ## Message families
//!
//! - **Gossip** (unsolicited): `CHAIN_HEAD`, `NEW_TRANSACTION`,
//!   `NEW_ACHIEVEMENT`, `NEW_REVIEW`, `CANDIDATE_BLOCK`, `NEW_BLOCK`
//! - **Request/response** (solicited): a `*_REQUEST` / `*_RESPONSE` pair
//!   per fetchable resource. Every request carries a caller-generated
//!   `request_id`; the response echoes it and is processed at most once.

use crate::entities::{
    Account, Achievement, Address, Block, BlockHeader, ChainHead, Hash, Review, Signature,
    Transaction, TrieProofStep,
};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_with::{serde_as, Bytes};
use uuid::Uuid;

/// The destination of a relay message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Room-scoped broadcast (`"*"` on the wire).
    Broadcast,
    /// A single peer, addressed by account address.
    Node(Address),
}

impl Serialize for Recipient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Recipient::Broadcast => serializer.serialize_str("*"),
            Recipient::Node(address) => {
                serializer.serialize_str(&shared_crypto::to_checksum_hex(address))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Recipient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecipientVisitor;

        impl Visitor<'_> for RecipientVisitor {
            type Value = Recipient;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("\"*\" or a hex-encoded address")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Recipient, E> {
                if value == "*" {
                    return Ok(Recipient::Broadcast);
                }
                shared_crypto::parse_checksum_hex(value)
                    .map(Recipient::Node)
                    .map_err(|e| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(RecipientVisitor)
    }
}

/// Envelope for every message carried by the relay transport.
///
/// The relay guarantees nothing beyond best-effort delivery; the payload
/// is untrusted until validated by the receiving subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope {
    /// Sender address.
    pub from: Address,
    /// Destination: a peer address or a room-scoped broadcast.
    pub to: Recipient,
    /// Room the message is scoped to, when broadcast.
    pub room: Option<String>,
    /// The typed payload.
    pub message: WireMessage,
    /// Send time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

// =============================================================================
// REQUEST / RESPONSE PAYLOADS
// =============================================================================

/// Request one account plus its trie proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The account address to prove.
    pub address: Address,
}

/// Response to [`AccountRequest`].
///
/// The proof must verify against the accounts root of the requester's
/// known header at `height`; an unverifiable response is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The account, if it exists at `height`.
    pub account: Option<Account>,
    /// Trie proof for the account (exactly trie-depth entries).
    pub proof: Vec<TrieProofStep>,
    /// The block height whose accounts root the proof targets.
    pub height: u64,
}

/// Request the responder's chain head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainHeadRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
}

/// Response to [`ChainHeadRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainHeadResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The responder's head, absent when its chain is empty.
    pub head: Option<ChainHead>,
}

/// Request a single block header by height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeaderRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The height to fetch.
    pub height: u64,
}

/// Response to [`BlockHeaderRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeaderResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The header, if the responder has it.
    pub header: Option<BlockHeader>,
}

/// Request a contiguous range of block headers (for catch-up).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeadersRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// First height of the range.
    pub from_height: u64,
    /// Maximum number of headers to return.
    pub limit: u64,
}

/// Response to [`BlockHeadersRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeadersResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// Headers in ascending height order.
    pub headers: Vec<BlockHeader>,
}

/// Request a single full block by height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The height to fetch.
    pub height: u64,
}

/// Response to [`BlockRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The block, if the responder has it.
    pub block: Option<Block>,
}

/// Request a contiguous range of full blocks (for catch-up).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocksRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// First height of the range.
    pub from_height: u64,
    /// Maximum number of blocks to return.
    pub limit: u64,
}

/// Response to [`BlocksRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocksResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// Blocks in ascending height order.
    pub blocks: Vec<Block>,
}

/// Request a single transaction by signature.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The transaction's signature (content address).
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// Response to [`TransactionRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The transaction, if known.
    pub transaction: Option<Transaction>,
}

/// Request the transactions of one finalized block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// Height of the block whose transactions are requested.
    pub block_height: u64,
}

/// Response to [`TransactionsRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The block's transactions in block order.
    pub transactions: Vec<Transaction>,
}

/// Request a single achievement by signature.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The achievement's signature (content address).
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// Response to [`AchievementRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The achievement, if known.
    pub achievement: Option<Achievement>,
}

/// Request the achievements of one finalized block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// Height of the block whose achievements are requested.
    pub block_height: u64,
}

/// Response to [`AchievementsRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The block's achievements in block order.
    pub achievements: Vec<Achievement>,
}

/// Request a single review by signature.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// The review's signature.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// Response to [`ReviewRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The review, if known.
    pub review: Option<Review>,
}

/// Request all known reviews of one achievement.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsRequest {
    /// Correlation id echoed by the response.
    pub request_id: Uuid,
    /// Content address of the reviewed achievement.
    #[serde_as(as = "Bytes")]
    pub achievement_signature: Signature,
}

/// Response to [`ReviewsRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsResponse {
    /// Correlation id from the request.
    pub request_id: Uuid,
    /// The reviews, unordered.
    pub reviews: Vec<Review>,
}

// =============================================================================
// THE TAGGED MESSAGE ENUM
// =============================================================================

/// Every message type carried by the relay, tagged exactly as on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WireMessage {
    /// Periodic announcement of a publisher's chain head.
    #[serde(rename = "CHAIN_HEAD")]
    ChainHead(ChainHead),
    /// Gossip: a newly submitted transaction.
    #[serde(rename = "NEW_TRANSACTION")]
    NewTransaction(Transaction),
    /// Gossip: a newly submitted achievement.
    #[serde(rename = "NEW_ACHIEVEMENT")]
    NewAchievement(Achievement),
    /// Gossip: a newly submitted review.
    #[serde(rename = "NEW_REVIEW")]
    NewReview(Review),
    /// A competing candidate block, re-broadcast during Consensus.
    #[serde(rename = "CANDIDATE_BLOCK")]
    CandidateBlock(Block),
    /// A finalized block announced at Announcement.
    #[serde(rename = "NEW_BLOCK")]
    NewBlock(Block),

    /// Solicited: account with trie proof.
    #[serde(rename = "ACCOUNT_REQUEST")]
    AccountRequest(AccountRequest),
    /// Reply to `ACCOUNT_REQUEST`.
    #[serde(rename = "ACCOUNT_RESPONSE")]
    AccountResponse(AccountResponse),
    /// Solicited: the responder's chain head.
    #[serde(rename = "CHAIN_HEAD_REQUEST")]
    ChainHeadRequest(ChainHeadRequest),
    /// Reply to `CHAIN_HEAD_REQUEST`.
    #[serde(rename = "CHAIN_HEAD_RESPONSE")]
    ChainHeadResponse(ChainHeadResponse),
    /// Solicited: one block header.
    #[serde(rename = "BLOCK_HEADER_REQUEST")]
    BlockHeaderRequest(BlockHeaderRequest),
    /// Reply to `BLOCK_HEADER_REQUEST`.
    #[serde(rename = "BLOCK_HEADER_RESPONSE")]
    BlockHeaderResponse(BlockHeaderResponse),
    /// Solicited: a header range.
    #[serde(rename = "BLOCK_HEADERS_REQUEST")]
    BlockHeadersRequest(BlockHeadersRequest),
    /// Reply to `BLOCK_HEADERS_REQUEST`.
    #[serde(rename = "BLOCK_HEADERS_RESPONSE")]
    BlockHeadersResponse(BlockHeadersResponse),
    /// Solicited: one full block.
    #[serde(rename = "BLOCK_REQUEST")]
    BlockRequest(BlockRequest),
    /// Reply to `BLOCK_REQUEST`.
    #[serde(rename = "BLOCK_RESPONSE")]
    BlockResponse(BlockResponse),
    /// Solicited: a block range.
    #[serde(rename = "BLOCKS_REQUEST")]
    BlocksRequest(BlocksRequest),
    /// Reply to `BLOCKS_REQUEST`.
    #[serde(rename = "BLOCKS_RESPONSE")]
    BlocksResponse(BlocksResponse),
    /// Solicited: one transaction.
    #[serde(rename = "TRANSACTION_REQUEST")]
    TransactionRequest(TransactionRequest),
    /// Reply to `TRANSACTION_REQUEST`.
    #[serde(rename = "TRANSACTION_RESPONSE")]
    TransactionResponse(TransactionResponse),
    /// Solicited: a block's transactions.
    #[serde(rename = "TRANSACTIONS_REQUEST")]
    TransactionsRequest(TransactionsRequest),
    /// Reply to `TRANSACTIONS_REQUEST`.
    #[serde(rename = "TRANSACTIONS_RESPONSE")]
    TransactionsResponse(TransactionsResponse),
    /// Solicited: one achievement.
    #[serde(rename = "ACHIEVEMENT_REQUEST")]
    AchievementRequest(AchievementRequest),
    /// Reply to `ACHIEVEMENT_REQUEST`.
    #[serde(rename = "ACHIEVEMENT_RESPONSE")]
    AchievementResponse(AchievementResponse),
    /// Solicited: a block's achievements.
    #[serde(rename = "ACHIEVEMENTS_REQUEST")]
    AchievementsRequest(AchievementsRequest),
    /// Reply to `ACHIEVEMENTS_REQUEST`.
    #[serde(rename = "ACHIEVEMENTS_RESPONSE")]
    AchievementsResponse(AchievementsResponse),
    /// Solicited: one review.
    #[serde(rename = "REVIEW_REQUEST")]
    ReviewRequest(ReviewRequest),
    /// Reply to `REVIEW_REQUEST`.
    #[serde(rename = "REVIEW_RESPONSE")]
    ReviewResponse(ReviewResponse),
    /// Solicited: an achievement's reviews.
    #[serde(rename = "REVIEWS_REQUEST")]
    ReviewsRequest(ReviewsRequest),
    /// Reply to `REVIEWS_REQUEST`.
    #[serde(rename = "REVIEWS_RESPONSE")]
    ReviewsResponse(ReviewsResponse),
}

impl WireMessage {
    /// The wire tag of this message, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            WireMessage::ChainHead(_) => "CHAIN_HEAD",
            WireMessage::NewTransaction(_) => "NEW_TRANSACTION",
            WireMessage::NewAchievement(_) => "NEW_ACHIEVEMENT",
            WireMessage::NewReview(_) => "NEW_REVIEW",
            WireMessage::CandidateBlock(_) => "CANDIDATE_BLOCK",
            WireMessage::NewBlock(_) => "NEW_BLOCK",
            WireMessage::AccountRequest(_) => "ACCOUNT_REQUEST",
            WireMessage::AccountResponse(_) => "ACCOUNT_RESPONSE",
            WireMessage::ChainHeadRequest(_) => "CHAIN_HEAD_REQUEST",
            WireMessage::ChainHeadResponse(_) => "CHAIN_HEAD_RESPONSE",
            WireMessage::BlockHeaderRequest(_) => "BLOCK_HEADER_REQUEST",
            WireMessage::BlockHeaderResponse(_) => "BLOCK_HEADER_RESPONSE",
            WireMessage::BlockHeadersRequest(_) => "BLOCK_HEADERS_REQUEST",
            WireMessage::BlockHeadersResponse(_) => "BLOCK_HEADERS_RESPONSE",
            WireMessage::BlockRequest(_) => "BLOCK_REQUEST",
            WireMessage::BlockResponse(_) => "BLOCK_RESPONSE",
            WireMessage::BlocksRequest(_) => "BLOCKS_REQUEST",
            WireMessage::BlocksResponse(_) => "BLOCKS_RESPONSE",
            WireMessage::TransactionRequest(_) => "TRANSACTION_REQUEST",
            WireMessage::TransactionResponse(_) => "TRANSACTION_RESPONSE",
            WireMessage::TransactionsRequest(_) => "TRANSACTIONS_REQUEST",
            WireMessage::TransactionsResponse(_) => "TRANSACTIONS_RESPONSE",
            WireMessage::AchievementRequest(_) => "ACHIEVEMENT_REQUEST",
            WireMessage::AchievementResponse(_) => "ACHIEVEMENT_RESPONSE",
            WireMessage::AchievementsRequest(_) => "ACHIEVEMENTS_REQUEST",
            WireMessage::AchievementsResponse(_) => "ACHIEVEMENTS_RESPONSE",
            WireMessage::ReviewRequest(_) => "REVIEW_REQUEST",
            WireMessage::ReviewResponse(_) => "REVIEW_RESPONSE",
            WireMessage::ReviewsRequest(_) => "REVIEWS_REQUEST",
            WireMessage::ReviewsResponse(_) => "REVIEWS_RESPONSE",
        }
    }

    /// The echoed correlation id, when this message is a response.
    pub fn response_request_id(&self) -> Option<Uuid> {
        match self {
            WireMessage::AccountResponse(r) => Some(r.request_id),
            WireMessage::ChainHeadResponse(r) => Some(r.request_id),
            WireMessage::BlockHeaderResponse(r) => Some(r.request_id),
            WireMessage::BlockHeadersResponse(r) => Some(r.request_id),
            WireMessage::BlockResponse(r) => Some(r.request_id),
            WireMessage::BlocksResponse(r) => Some(r.request_id),
            WireMessage::TransactionResponse(r) => Some(r.request_id),
            WireMessage::TransactionsResponse(r) => Some(r.request_id),
            WireMessage::AchievementResponse(r) => Some(r.request_id),
            WireMessage::AchievementsResponse(r) => Some(r.request_id),
            WireMessage::ReviewResponse(r) => Some(r.request_id),
            WireMessage::ReviewsResponse(r) => Some(r.request_id),
            _ => None,
        }
    }
}

/// A hash usable as a dedup key for a gossip message.
///
/// Entities key by signature, blocks and heads by header hash, always
/// mixed with the wire tag so a finalized block is never mistaken for
/// the candidate that carried the same header.
pub fn gossip_dedup_key(message: &WireMessage) -> Option<Hash> {
    let body: &[u8] = match message {
        WireMessage::NewTransaction(tx) => &tx.signature,
        WireMessage::NewAchievement(a) => &a.signature,
        WireMessage::NewReview(r) => &r.signature,
        WireMessage::CandidateBlock(b) | WireMessage::NewBlock(b) => &b.header.hash,
        WireMessage::ChainHead(h) => &h.hash,
        _ => return None,
    };
    Some(shared_crypto::keccak256_parts(&[
        message.tag().as_bytes(),
        body,
    ]))
}
