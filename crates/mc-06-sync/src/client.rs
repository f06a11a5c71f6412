//! # Sync Client
//!
//! Issues correlated requests to the chosen sync peer and folds verified
//! responses into local state. Nothing a peer sends is trusted: entity
//! signatures are re-checked, blocks are fully verified before their
//! headers enter the chain, and account responses must prove themselves
//! against a header this node already holds.

use crate::gossip::GossipValidator;
use crate::headers::HeaderChain;
use crate::requests::{PendingRequests, RequestKind};
use mc_02_state_trie::verify_account_proof;
use mc_03_validation::{
    verify_achievement, verify_review, verify_transaction, BlockValidator,
};
use shared_types::protocol::{
    AccountRequest, AchievementRequest, AchievementsRequest, BlockHeaderRequest,
    BlockHeadersRequest, BlockRequest, BlocksRequest, ChainHeadRequest, ReviewRequest,
    ReviewsRequest, TransactionRequest, TransactionsRequest,
};
use shared_types::{
    Account, Achievement, Address, Block, ChainHead, ChainParams, Review, Signature, Transaction,
    WireMessage,
};
use uuid::Uuid;

/// A verified outcome of one response (or block gossip).
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A peer's chain head, signature-checked.
    Head(ChainHead),
    /// Headers appended to the local chain.
    HeadersAppended(usize),
    /// A fully verified block whose header is now part of the chain.
    Block(Block),
    /// Fully verified blocks appended in order.
    Blocks(Vec<Block>),
    /// An account proven against a locally known accounts root.
    AccountVerified(Account),
    /// The peer claims the account does not exist (unprovable; callers
    /// treat this as a hint, not a fact).
    AccountAbsent(Address),
    /// A verified transaction.
    Transaction(Transaction),
    /// Verified transactions of one block.
    Transactions(Vec<Transaction>),
    /// A verified achievement.
    Achievement(Achievement),
    /// Verified achievements of one block.
    Achievements(Vec<Achievement>),
    /// A verified review.
    Review(Review),
    /// Verified reviews of one achievement.
    Reviews(Vec<Review>),
}

/// The light node's request/response state machine.
pub struct SyncClient {
    peer: Option<Address>,
    requests: PendingRequests,
    headers: HeaderChain,
    validator: BlockValidator,
    gossip: GossipValidator,
}

impl SyncClient {
    /// A client with an empty header chain and no chosen peer.
    pub fn new(params: &ChainParams) -> Self {
        Self {
            peer: None,
            requests: PendingRequests::new(),
            headers: HeaderChain::new(),
            validator: BlockValidator::new(params),
            gossip: GossipValidator::new(),
        }
    }

    /// Choose the full node to source request/response data from.
    pub fn set_peer(&mut self, peer: Address) {
        self.peer = Some(peer);
    }

    /// The chosen sync peer.
    pub fn peer(&self) -> Option<Address> {
        self.peer
    }

    /// The locally known header chain.
    pub fn headers(&self) -> &HeaderChain {
        &self.headers
    }

    /// Outstanding request count.
    pub fn outstanding(&self) -> usize {
        self.requests.len()
    }

    /// Evict stale requests. Removal-only.
    pub fn sweep(&mut self, now_ms: u64) {
        self.requests.sweep(now_ms);
    }

    // === REQUEST BUILDERS ===

    fn issue(&mut self, kind: RequestKind, now_ms: u64) -> Uuid {
        let request_id = Uuid::new_v4();
        self.requests.track(request_id, kind, now_ms);
        request_id
    }

    /// Build a `CHAIN_HEAD_REQUEST`.
    pub fn request_chain_head(&mut self, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::ChainHead, now_ms);
        WireMessage::ChainHeadRequest(ChainHeadRequest { request_id })
    }

    /// Build an `ACCOUNT_REQUEST`.
    pub fn request_account(&mut self, address: Address, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Account { address }, now_ms);
        WireMessage::AccountRequest(AccountRequest {
            request_id,
            address,
        })
    }

    /// Build a `BLOCK_HEADER_REQUEST`.
    pub fn request_block_header(&mut self, height: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::BlockHeader { height }, now_ms);
        WireMessage::BlockHeaderRequest(BlockHeaderRequest { request_id, height })
    }

    /// Build a `BLOCK_HEADERS_REQUEST` for catch-up.
    pub fn request_block_headers(&mut self, from_height: u64, limit: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::BlockHeaders, now_ms);
        WireMessage::BlockHeadersRequest(BlockHeadersRequest {
            request_id,
            from_height,
            limit,
        })
    }

    /// Build a `BLOCK_REQUEST`.
    pub fn request_block(&mut self, height: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Block { height }, now_ms);
        WireMessage::BlockRequest(BlockRequest { request_id, height })
    }

    /// Build a `BLOCKS_REQUEST` for catch-up.
    pub fn request_blocks(&mut self, from_height: u64, limit: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Blocks, now_ms);
        WireMessage::BlocksRequest(BlocksRequest {
            request_id,
            from_height,
            limit,
        })
    }

    /// Build a `TRANSACTION_REQUEST`.
    pub fn request_transaction(&mut self, signature: Signature, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Transaction { signature }, now_ms);
        WireMessage::TransactionRequest(TransactionRequest {
            request_id,
            signature,
        })
    }

    /// Build a `TRANSACTIONS_REQUEST` for one block.
    pub fn request_transactions(&mut self, block_height: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Transactions, now_ms);
        WireMessage::TransactionsRequest(TransactionsRequest {
            request_id,
            block_height,
        })
    }

    /// Build an `ACHIEVEMENT_REQUEST`.
    pub fn request_achievement(&mut self, signature: Signature, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Achievement { signature }, now_ms);
        WireMessage::AchievementRequest(AchievementRequest {
            request_id,
            signature,
        })
    }

    /// Build an `ACHIEVEMENTS_REQUEST` for one block.
    pub fn request_achievements(&mut self, block_height: u64, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Achievements, now_ms);
        WireMessage::AchievementsRequest(AchievementsRequest {
            request_id,
            block_height,
        })
    }

    /// Build a `REVIEW_REQUEST`.
    pub fn request_review(&mut self, signature: Signature, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Review { signature }, now_ms);
        WireMessage::ReviewRequest(ReviewRequest {
            request_id,
            signature,
        })
    }

    /// Build a `REVIEWS_REQUEST` for one achievement.
    pub fn request_reviews(&mut self, achievement_signature: Signature, now_ms: u64) -> WireMessage {
        let request_id = self.issue(RequestKind::Reviews, now_ms);
        WireMessage::ReviewsRequest(ReviewsRequest {
            request_id,
            achievement_signature,
        })
    }

    // === INBOUND ===

    /// Process a solicited response.
    ///
    /// Unknown/stale correlation ids, kind mismatches, and anything that
    /// fails verification yield `None` and are dropped without error.
    pub fn handle_response(&mut self, message: &WireMessage) -> Option<SyncEvent> {
        let request_id = message.response_request_id()?;
        let kind = self.requests.take(&request_id)?;

        match (kind, message) {
            (RequestKind::ChainHead, WireMessage::ChainHeadResponse(response)) => {
                let head = response.head.clone()?;
                self.gossip.check_chain_head(&head).then_some(SyncEvent::Head(head))
            }

            (RequestKind::Account { address }, WireMessage::AccountResponse(response)) => {
                match &response.account {
                    Some(account) => {
                        if account.address != address {
                            tracing::debug!("account response for the wrong address");
                            return None;
                        }
                        let header = self.headers.get(response.height)?;
                        verify_account_proof(account, &response.proof, &header.accounts_root)
                            .then(|| SyncEvent::AccountVerified(account.clone()))
                    }
                    None => Some(SyncEvent::AccountAbsent(address)),
                }
            }

            (RequestKind::BlockHeader { height }, WireMessage::BlockHeaderResponse(response)) => {
                let header = response.header.clone()?;
                if header.height != height {
                    return None;
                }
                let appended = self.headers.append(header).is_ok();
                appended.then_some(SyncEvent::HeadersAppended(1))
            }

            (RequestKind::BlockHeaders, WireMessage::BlockHeadersResponse(response)) => {
                let mut appended = 0;
                for header in response.headers.clone() {
                    if self.headers.append(header).is_err() {
                        break;
                    }
                    appended += 1;
                }
                (appended > 0).then_some(SyncEvent::HeadersAppended(appended))
            }

            (RequestKind::Block { height }, WireMessage::BlockResponse(response)) => {
                let block = response.block.clone()?;
                if block.header.height != height {
                    return None;
                }
                self.adopt_block(block).map(SyncEvent::Block)
            }

            (RequestKind::Blocks, WireMessage::BlocksResponse(response)) => {
                let mut adopted = Vec::new();
                for block in response.blocks.clone() {
                    match self.adopt_block(block) {
                        Some(block) => adopted.push(block),
                        None => break,
                    }
                }
                (!adopted.is_empty()).then_some(SyncEvent::Blocks(adopted))
            }

            (RequestKind::Transaction { signature }, WireMessage::TransactionResponse(response)) => {
                let tx = response.transaction.clone()?;
                (tx.signature == signature && verify_transaction(&tx))
                    .then_some(SyncEvent::Transaction(tx))
            }

            (RequestKind::Transactions, WireMessage::TransactionsResponse(response)) => {
                let txs: Vec<Transaction> = response
                    .transactions
                    .iter()
                    .filter(|tx| verify_transaction(tx))
                    .cloned()
                    .collect();
                (!txs.is_empty()).then_some(SyncEvent::Transactions(txs))
            }

            (RequestKind::Achievement { signature }, WireMessage::AchievementResponse(response)) => {
                let achievement = response.achievement.clone()?;
                (achievement.signature == signature && verify_achievement(&achievement))
                    .then_some(SyncEvent::Achievement(achievement))
            }

            (RequestKind::Achievements, WireMessage::AchievementsResponse(response)) => {
                let achievements: Vec<Achievement> = response
                    .achievements
                    .iter()
                    .filter(|a| verify_achievement(a))
                    .cloned()
                    .collect();
                (!achievements.is_empty()).then_some(SyncEvent::Achievements(achievements))
            }

            (RequestKind::Review { signature }, WireMessage::ReviewResponse(response)) => {
                let review = response.review.clone()?;
                (review.signature == signature && verify_review(&review))
                    .then_some(SyncEvent::Review(review))
            }

            (RequestKind::Reviews, WireMessage::ReviewsResponse(response)) => {
                let reviews: Vec<Review> = response
                    .reviews
                    .iter()
                    .filter(|r| verify_review(r))
                    .cloned()
                    .collect();
                (!reviews.is_empty()).then_some(SyncEvent::Reviews(reviews))
            }

            (kind, message) => {
                tracing::debug!(tag = message.tag(), ?kind, "response kind mismatch");
                None
            }
        }
    }

    /// Fold a gossiped `NEW_BLOCK` into the chain.
    ///
    /// Accepted only when it extends the tip by exactly one height with a
    /// matching parent hash and fully verifies.
    pub fn ingest_block_gossip(&mut self, block: Block) -> Option<Block> {
        match self.headers.tip() {
            Some(tip) if !self.gossip.check_block_extends(&block, tip) => {
                tracing::debug!(
                    height = block.header.height,
                    tip = tip.height,
                    "gossiped block does not extend the tip"
                );
                None
            }
            _ => self.adopt_block(block),
        }
    }

    /// Verify a block and append its header. Returns the block on success.
    fn adopt_block(&mut self, block: Block) -> Option<Block> {
        if !self.validator.verify(&block) {
            return None;
        }
        self.headers.append(block.header.clone()).ok()?;
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::protocol::{AccountResponse, BlockHeadersResponse, ChainHeadResponse};
    use shared_types::{BlockHeader, GENESIS_HEIGHT};

    fn client() -> SyncClient {
        SyncClient::new(&ChainParams::for_testing())
    }

    fn chained_headers(n: u64) -> Vec<BlockHeader> {
        let mut headers = Vec::new();
        let mut previous_hash = [0u8; 32];
        for height in GENESIS_HEIGHT..GENESIS_HEIGHT + n {
            let mut header = BlockHeader {
                height,
                previous_hash,
                timestamp_ms: height,
                ..BlockHeader::default()
            };
            header.hash = header.compute_hash();
            previous_hash = header.hash;
            headers.push(header);
        }
        headers
    }

    #[test]
    fn test_matching_response_processed_once() {
        let mut client = client();
        let request = client.request_chain_head(1_000);
        let WireMessage::ChainHeadRequest(request) = request else {
            panic!("wrong request shape");
        };

        let response = WireMessage::ChainHeadResponse(ChainHeadResponse {
            request_id: request.request_id,
            head: Some(ChainHead {
                height: 4,
                hash: [0x11; 32],
                publisher_address: [0x22; 20],
                publisher_public_key: None,
                signature: None,
            }),
        });

        assert!(matches!(
            client.handle_response(&response),
            Some(SyncEvent::Head(_))
        ));
        // Same response again: at-most-once.
        assert!(client.handle_response(&response).is_none());
    }

    #[test]
    fn test_unknown_request_id_dropped() {
        let mut client = client();
        let response = WireMessage::ChainHeadResponse(ChainHeadResponse {
            request_id: Uuid::new_v4(),
            head: None,
        });
        assert!(client.handle_response(&response).is_none());
    }

    #[test]
    fn test_headers_catch_up() {
        let mut client = client();
        let request = client.request_block_headers(GENESIS_HEIGHT, 10, 0);
        let WireMessage::BlockHeadersRequest(request) = request else {
            panic!("wrong request shape");
        };

        let response = WireMessage::BlockHeadersResponse(BlockHeadersResponse {
            request_id: request.request_id,
            headers: chained_headers(3),
        });

        assert!(matches!(
            client.handle_response(&response),
            Some(SyncEvent::HeadersAppended(3))
        ));
        assert_eq!(client.headers().height(), GENESIS_HEIGHT + 2);
    }

    #[test]
    fn test_account_response_needs_proof_against_known_header() {
        use mc_02_state_trie::SparseAddressTrie;

        let mut trie = SparseAddressTrie::new();
        trie.insert(Account {
            address: [0xAB; 20],
            balance: 7,
            ..Account::default()
        });

        // The client knows a genesis header committing to this trie.
        let mut header = BlockHeader {
            height: GENESIS_HEIGHT,
            accounts_root: trie.root(),
            ..BlockHeader::default()
        };
        header.hash = header.compute_hash();

        let mut client = client();
        client.headers.append(header).unwrap();

        let request = client.request_account([0xAB; 20], 0);
        let WireMessage::AccountRequest(request) = request else {
            panic!("wrong request shape");
        };

        let (account, proof) = trie.get(&[0xAB; 20]);
        let response = WireMessage::AccountResponse(AccountResponse {
            request_id: request.request_id,
            account,
            proof,
            height: GENESIS_HEIGHT,
        });

        assert!(matches!(
            client.handle_response(&response),
            Some(SyncEvent::AccountVerified(a)) if a.balance == 7
        ));
    }

    #[test]
    fn test_account_response_with_bad_proof_dropped() {
        use mc_02_state_trie::SparseAddressTrie;

        let mut trie = SparseAddressTrie::new();
        trie.insert(Account {
            address: [0xAB; 20],
            balance: 7,
            ..Account::default()
        });

        // Known header commits to a DIFFERENT root.
        let mut header = BlockHeader {
            height: GENESIS_HEIGHT,
            accounts_root: [0xEE; 32],
            ..BlockHeader::default()
        };
        header.hash = header.compute_hash();

        let mut client = client();
        client.headers.append(header).unwrap();

        let request = client.request_account([0xAB; 20], 0);
        let WireMessage::AccountRequest(request) = request else {
            panic!("wrong request shape");
        };

        let (account, proof) = trie.get(&[0xAB; 20]);
        let response = WireMessage::AccountResponse(AccountResponse {
            request_id: request.request_id,
            account,
            proof,
            height: GENESIS_HEIGHT,
        });

        assert!(client.handle_response(&response).is_none());
    }

    #[test]
    fn test_response_kind_mismatch_dropped() {
        let mut client = client();
        let request = client.request_chain_head(0);
        let WireMessage::ChainHeadRequest(request) = request else {
            panic!("wrong request shape");
        };

        // A block-headers response echoing the chain-head request id.
        let response = WireMessage::BlockHeadersResponse(BlockHeadersResponse {
            request_id: request.request_id,
            headers: chained_headers(1),
        });
        assert!(client.handle_response(&response).is_none());
        // And the entry is consumed: the real response is now stale too.
        assert_eq!(client.outstanding(), 0);
    }
}
