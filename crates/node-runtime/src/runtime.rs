//! # Node Runtime
//!
//! The event loop joining the phase ticker, the relay, the consensus
//! engine (full role) or sync client (light role), and the periodic
//! broadcast tasks. One event at a time, run to completion: no locks
//! around node state.

use crate::config::NodeConfig;
use crate::events::{NodeEvent, ReviewOutcome};
use crate::identity::create_identity;
use crate::ports::{LedgerStore, RelayTransport, ReviewProducer};
use crate::tasks::RepeatingTask;
use anyhow::Context;
use mc_04_phase_clock::{
    EditionClock, Phase, PhaseTicker, PhaseTransition, SystemTimeSource, TimeSource,
};
use mc_05_consensus::ConsensusEngine;
use mc_06_sync::{GossipValidator, SeenCache, SyncClient, SyncEvent};
use shared_crypto::MeritKeyPair;
use shared_types::protocol::{
    AccountResponse, AchievementResponse, AchievementsResponse, BlockHeaderResponse,
    BlockHeadersResponse, BlockResponse, BlocksResponse, ChainHeadResponse, ReviewResponse,
    ReviewsResponse, TransactionResponse, TransactionsResponse,
};
use shared_types::{
    gossip_dedup_key, Block, BlockHeader, ChainHead, Identity, NodeRole, Recipient,
    RelayEnvelope, Review, WireMessage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

enum RoleState<S: LedgerStore + 'static> {
    Full {
        engine: ConsensusEngine<S>,
        store: Arc<S>,
    },
    Light {
        sync: SyncClient,
    },
}

/// A running Merit-Chain participant.
pub struct NodeRuntime<S: LedgerStore + 'static> {
    config: NodeConfig,
    identity: Identity,
    keypair: MeritKeyPair,
    relay: Arc<dyn RelayTransport>,
    review_producer: Option<Arc<dyn ReviewProducer>>,
    clock: EditionClock,
    time: Arc<dyn TimeSource>,
    seen: SeenCache,
    gossip: GossipValidator,
    role: RoleState<S>,
    head_watch: watch::Sender<Option<ChainHead>>,
    candidate_watch: watch::Sender<Option<Block>>,
    candidate_task: Option<RepeatingTask>,
    events_tx: mpsc::Sender<NodeEvent>,
    events_rx: Option<mpsc::Receiver<NodeEvent>>,
}

impl<S: LedgerStore + 'static> NodeRuntime<S> {
    /// Create a node: derive its identity, bootstrap its role state.
    pub async fn new(
        config: NodeConfig,
        relay: Arc<dyn RelayTransport>,
        store: Arc<S>,
    ) -> anyhow::Result<Self> {
        let (keypair, identity) =
            create_identity(&config).context("failed to create node identity")?;
        let clock = EditionClock::new(&config.params);

        let role = match config.role {
            NodeRole::Full => RoleState::Full {
                engine: ConsensusEngine::bootstrap(Arc::clone(&store), config.params.clone())
                    .await
                    .context("failed to bootstrap consensus engine")?,
                store,
            },
            NodeRole::Light => RoleState::Light {
                sync: SyncClient::new(&config.params),
            },
        };

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (head_watch, _) = watch::channel(None);
        let (candidate_watch, _) = watch::channel(None);

        let runtime = Self {
            config,
            identity,
            keypair,
            relay,
            review_producer: None,
            clock,
            time: Arc::new(SystemTimeSource),
            seen: SeenCache::new(),
            gossip: GossipValidator::new(),
            role,
            head_watch,
            candidate_watch,
            candidate_task: None,
            events_tx,
            events_rx: Some(events_rx),
        };

        if let RoleState::Full { engine, .. } = &runtime.role {
            let head = runtime.signed_chain_head(engine.head());
            let _ = runtime.head_watch.send(Some(head));
        }

        Ok(runtime)
    }

    /// This node's signed identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// A sender into the node's event channel (review completions,
    /// injected events in tests).
    pub fn events_sender(&self) -> mpsc::Sender<NodeEvent> {
        self.events_tx.clone()
    }

    /// Install the review producer (full nodes that evaluate achievements).
    pub fn set_review_producer(&mut self, producer: Arc<dyn ReviewProducer>) {
        self.review_producer = Some(producer);
    }

    /// Observe this node's view of the chain head (full: finalized head;
    /// light: synced tip).
    pub fn head_subscription(&self) -> watch::Receiver<Option<ChainHead>> {
        self.head_watch.subscribe()
    }

    /// Forward an inbox of relay envelopes into the event loop.
    pub fn attach_inbound(&self, mut inbox: mpsc::Receiver<RelayEnvelope>) {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                if events.send(NodeEvent::Inbound(envelope)).await.is_err() {
                    return;
                }
            }
        });
    }

    /// Run the node until `shutdown` flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!("===========================================");
        tracing::info!("  Merit-Chain Node v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("  Role: {}", self.identity.role.as_str());
        tracing::info!(
            "  Address: {}",
            shared_crypto::to_checksum_hex(&self.identity.address)
        );
        tracing::info!("  Room: {}", self.config.room);
        tracing::info!("===========================================");

        if let RoleState::Light { sync } = &mut self.role {
            choose_sync_peer(sync, self.relay.as_ref(), &self.config.room).await;
        }

        // Phase ticker feeding the event channel via a forwarder.
        let (phase_tx, mut phase_rx) = mpsc::channel(64);
        let mut ticker = PhaseTicker::spawn(
            self.clock,
            Arc::clone(&self.time),
            Duration::from_millis(self.config.tick_ms),
            phase_tx,
        );
        {
            let events = self.events_tx.clone();
            tokio::spawn(async move {
                while let Some(transition) = phase_rx.recv().await {
                    if events.send(NodeEvent::Phase(transition)).await.is_err() {
                        return;
                    }
                }
            });
        }

        // Periodic sweep of the dedup cache and pending-request table.
        let _sweep_task = {
            let events = self.events_tx.clone();
            RepeatingTask::spawn(
                Duration::from_millis(self.config.sweep_interval_ms),
                move || {
                    let events = events.clone();
                    async move {
                        let _ = events.try_send(NodeEvent::Sweep);
                    }
                },
            )
        };

        // Periodic chain-head broadcast (full nodes publish their head).
        let _head_task = if matches!(self.role, RoleState::Full { .. }) {
            Some(self.spawn_watch_broadcast(
                self.head_watch.subscribe(),
                Duration::from_millis(self.config.head_broadcast_ms),
                WireMessage::ChainHead,
            ))
        } else {
            None
        };

        let mut events_rx = self
            .events_rx
            .take()
            .context("runtime already consumed its event channel")?;

        loop {
            tokio::select! {
                maybe_event = events_rx.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event).await,
                        None => break,
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        ticker.stop();
        if let Some(task) = &mut self.candidate_task {
            task.stop();
        }
        tracing::info!("node stopped");
        Ok(())
    }

    // === EVENT DISPATCH ===

    async fn handle_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::Phase(transition) => self.handle_phase(transition).await,
            NodeEvent::Inbound(envelope) => self.handle_inbound(envelope).await,
            NodeEvent::ReviewCompleted(outcome) => self.handle_review_outcome(outcome).await,
            NodeEvent::Sweep => self.handle_sweep(),
        }
    }

    async fn handle_phase(&mut self, transition: PhaseTransition) {
        let now = self.time.now_ms();
        let mut outbound: Vec<(Recipient, WireMessage)> = Vec::new();

        match &mut self.role {
            RoleState::Full { engine, .. } => match transition.phase {
                Phase::Submission => {
                    engine.on_submission_start(transition.edition);
                }
                Phase::Review => {
                    engine.on_review_start(transition.edition);
                }
                Phase::Consensus => {
                    let candidate = engine.on_consensus_start(now);
                    let _ = self.candidate_watch.send(Some(candidate.clone()));
                    outbound.push((
                        Recipient::Broadcast,
                        WireMessage::CandidateBlock(candidate),
                    ));
                }
                Phase::Announcement => {
                    if let Some(task) = &mut self.candidate_task {
                        task.stop();
                    }
                    self.candidate_task = None;
                    let _ = self.candidate_watch.send(None);

                    match engine.on_announcement_start().await {
                        Ok(Some(block)) => {
                            let head = chain_head_for(
                                &block.header,
                                &self.identity,
                                &self.keypair,
                            );
                            let _ = self.head_watch.send(Some(head.clone()));
                            outbound.push((
                                Recipient::Broadcast,
                                WireMessage::NewBlock(block),
                            ));
                            outbound.push((Recipient::Broadcast, WireMessage::ChainHead(head)));
                        }
                        Ok(None) => {}
                        Err(error) => {
                            tracing::error!(%error, "finalization aborted for this edition");
                        }
                    }
                }
            },
            RoleState::Light { sync } => {
                // Each phase boundary, nudge the sync peer for its head.
                if let Some(peer) = sync.peer() {
                    outbound.push((Recipient::Node(peer), sync.request_chain_head(now)));
                }
            }
        }

        // Candidate re-broadcast runs only while in Consensus.
        if matches!(self.role, RoleState::Full { .. }) && transition.phase == Phase::Consensus {
            self.candidate_task = Some(self.spawn_watch_broadcast(
                self.candidate_watch.subscribe(),
                Duration::from_millis(self.config.candidate_rebroadcast_ms),
                WireMessage::CandidateBlock,
            ));
        }

        for (to, message) in outbound {
            self.send_to(to, message).await;
        }
    }

    async fn handle_inbound(&mut self, envelope: RelayEnvelope) {
        if envelope.from == self.identity.address {
            return;
        }
        let now = self.time.now_ms();

        // Dedup gossip by signature/hash; duplicates are dropped here.
        if let Some(key) = gossip_dedup_key(&envelope.message) {
            if !self.seen.insert_if_new(key, now) {
                return;
            }
        }

        let Ok(status) = self.clock.status(now) else {
            // Pre-genesis traffic is premature; drop it.
            return;
        };

        let mut outbound: Vec<(Recipient, WireMessage)> = Vec::new();
        let mut assign: Option<shared_types::Achievement> = None;

        match &mut self.role {
            RoleState::Full { engine, store } => match envelope.message {
                WireMessage::NewTransaction(tx) => {
                    if self.gossip.check_transaction(&tx) {
                        engine.submit_transaction(tx);
                    }
                }
                WireMessage::NewAchievement(achievement) => {
                    if self.gossip.check_achievement(&achievement, &status)
                        && engine.submit_achievement(achievement.clone())
                    {
                        assign = Some(achievement);
                    }
                }
                WireMessage::NewReview(review) => {
                    if self.gossip.check_review(&review, &status) {
                        engine.submit_review(review);
                    }
                }
                WireMessage::CandidateBlock(candidate) => {
                    if self.gossip.check_candidate_phase(&status) {
                        if let Some(adopted) = engine.on_peer_candidate(candidate) {
                            let _ = self.candidate_watch.send(Some(adopted.clone()));
                        }
                    }
                }
                WireMessage::NewBlock(block) => {
                    match engine.accept_finalized_block(block).await {
                        Ok(true) => {
                            let head = chain_head_for(
                                engine.head(),
                                &self.identity,
                                &self.keypair,
                            );
                            let _ = self.head_watch.send(Some(head));
                        }
                        Ok(false) => {}
                        Err(error) => {
                            tracing::warn!(%error, "could not persist peer block");
                        }
                    }
                }
                WireMessage::ChainHead(head) => {
                    if self.gossip.check_chain_head(&head)
                        && head.height > engine.head().height
                    {
                        tracing::debug!(
                            peer_height = head.height,
                            local_height = engine.head().height,
                            "peer is ahead; awaiting NEW_BLOCK gossip"
                        );
                    }
                }
                request => {
                    let response = serve_request(
                        engine,
                        store.as_ref(),
                        &self.identity,
                        &self.keypair,
                        request,
                    )
                    .await;
                    if let Some(response) = response {
                        outbound.push((Recipient::Node(envelope.from), response));
                    }
                }
            },
            RoleState::Light { sync } => match envelope.message {
                WireMessage::NewBlock(block) => {
                    if let Some(adopted) = sync.ingest_block_gossip(block) {
                        tracing::info!(height = adopted.header.height, "synced gossiped block");
                    }
                }
                WireMessage::ChainHead(head) => {
                    if self.gossip.check_chain_head(&head) {
                        if sync.peer().is_none() {
                            sync.set_peer(head.publisher_address);
                        }
                        outbound.extend(catch_up_requests(sync, head.height, now));
                    }
                }
                WireMessage::NewTransaction(_)
                | WireMessage::NewAchievement(_)
                | WireMessage::NewReview(_)
                | WireMessage::CandidateBlock(_) => {
                    // Light nodes track the chain, not the pending sets.
                }
                response => {
                    match sync.handle_response(&response) {
                        Some(SyncEvent::Head(head)) => {
                            if sync.peer().is_none() {
                                sync.set_peer(head.publisher_address);
                            }
                            outbound.extend(catch_up_requests(sync, head.height, now));
                        }
                        Some(SyncEvent::Blocks(blocks)) => {
                            tracing::info!(count = blocks.len(), "synced block range");
                        }
                        Some(event) => {
                            tracing::debug!(?event, "sync event");
                        }
                        None => {}
                    }
                }
            },
        }

        if let (Some(achievement), Some(producer)) = (assign, &self.review_producer) {
            producer.assign(achievement);
        }

        // Light nodes publish their synced tip on the head watch.
        if let RoleState::Light { sync } = &self.role {
            if let Some(tip) = sync.headers().tip() {
                let known = self.head_watch.borrow().as_ref().map(|h| h.height);
                if known != Some(tip.height) {
                    let _ = self.head_watch.send(Some(ChainHead {
                        height: tip.height,
                        hash: tip.hash,
                        publisher_address: self.identity.address,
                        publisher_public_key: None,
                        signature: None,
                    }));
                }
            }
        }

        for (to, message) in outbound {
            self.send_to(to, message).await;
        }
    }

    async fn handle_review_outcome(&mut self, outcome: ReviewOutcome) {
        let now = self.time.now_ms();
        let Ok(status) = self.clock.status(now) else {
            return;
        };

        let mut review = Review {
            target_edition: status.edition,
            achievement_signature: outcome.achievement_signature,
            reviewer_name: self.identity.display_name.clone(),
            reviewer_address: self.identity.address,
            scores: outcome.scores,
            comment: outcome.comment,
            reviewer_public_key: self.identity.public_key,
            timestamp_ms: now,
            signature: [0u8; 64],
        };
        let Ok(signature) = self.keypair.sign(&review.signing_hash()) else {
            tracing::error!("no usable signing key; dropping review outcome");
            return;
        };
        review.signature = signature;

        if let RoleState::Full { engine, .. } = &mut self.role {
            if engine.submit_review(review.clone()) {
                self.send_to(Recipient::Broadcast, WireMessage::NewReview(review))
                    .await;
            }
        }
    }

    fn handle_sweep(&mut self) {
        let now = self.time.now_ms();
        self.seen.sweep(now);
        if let RoleState::Light { sync } = &mut self.role {
            sync.sweep(now);
        }
    }

    // === OUTBOUND HELPERS ===

    async fn send_to(&self, to: Recipient, message: WireMessage) {
        let envelope = RelayEnvelope {
            from: self.identity.address,
            to,
            room: Some(self.config.room.clone()),
            message,
            timestamp_ms: self.time.now_ms(),
        };
        if let Err(error) = self.relay.send(envelope).await {
            tracing::warn!(%error, "relay send failed");
        }
    }

    /// Periodically broadcast whatever a watch channel currently holds.
    fn spawn_watch_broadcast<T: Clone + Send + Sync + 'static>(
        &self,
        watched: watch::Receiver<Option<T>>,
        period: Duration,
        wrap: fn(T) -> WireMessage,
    ) -> RepeatingTask {
        let relay = Arc::clone(&self.relay);
        let from = self.identity.address;
        let room = self.config.room.clone();
        let time = Arc::clone(&self.time);

        RepeatingTask::spawn(period, move || {
            let relay = Arc::clone(&relay);
            let room = room.clone();
            let time = Arc::clone(&time);
            let current = watched.borrow().clone();
            async move {
                if let Some(value) = current {
                    let envelope = RelayEnvelope {
                        from,
                        to: Recipient::Broadcast,
                        room: Some(room),
                        message: wrap(value),
                        timestamp_ms: time.now_ms(),
                    };
                    if let Err(error) = relay.send(envelope).await {
                        tracing::warn!(%error, "periodic broadcast failed");
                    }
                }
            }
        })
    }

    fn signed_chain_head(&self, header: &BlockHeader) -> ChainHead {
        chain_head_for(header, &self.identity, &self.keypair)
    }
}

/// Answer a solicited request from the full node's state and store.
///
/// A store failure yields `None`: the requester re-requests later.
async fn serve_request<S: LedgerStore>(
    engine: &ConsensusEngine<S>,
    store: &S,
    identity: &Identity,
    keypair: &MeritKeyPair,
    request: WireMessage,
) -> Option<WireMessage> {
    match request {
        WireMessage::AccountRequest(req) => {
            let (account, proof) = engine.account_with_proof(&req.address);
            Some(WireMessage::AccountResponse(AccountResponse {
                request_id: req.request_id,
                account,
                proof,
                height: engine.head().height,
            }))
        }
        WireMessage::ChainHeadRequest(req) => {
            Some(WireMessage::ChainHeadResponse(ChainHeadResponse {
                request_id: req.request_id,
                head: Some(chain_head_for(engine.head(), identity, keypair)),
            }))
        }
        WireMessage::BlockHeaderRequest(req) => {
            let header = store.block_header(req.height).await.ok()?;
            Some(WireMessage::BlockHeaderResponse(BlockHeaderResponse {
                request_id: req.request_id,
                header,
            }))
        }
        WireMessage::BlockHeadersRequest(req) => {
            let headers = store.block_headers(req.from_height, req.limit).await.ok()?;
            Some(WireMessage::BlockHeadersResponse(BlockHeadersResponse {
                request_id: req.request_id,
                headers,
            }))
        }
        WireMessage::BlockRequest(req) => {
            let block = store.block(req.height).await.ok()?;
            Some(WireMessage::BlockResponse(BlockResponse {
                request_id: req.request_id,
                block,
            }))
        }
        WireMessage::BlocksRequest(req) => {
            let blocks = store.blocks(req.from_height, req.limit).await.ok()?;
            Some(WireMessage::BlocksResponse(BlocksResponse {
                request_id: req.request_id,
                blocks,
            }))
        }
        WireMessage::TransactionRequest(req) => {
            let transaction = store.transaction(&req.signature).await.ok()?;
            Some(WireMessage::TransactionResponse(TransactionResponse {
                request_id: req.request_id,
                transaction,
            }))
        }
        WireMessage::TransactionsRequest(req) => {
            let transactions = store.transactions_in_block(req.block_height).await.ok()?;
            Some(WireMessage::TransactionsResponse(TransactionsResponse {
                request_id: req.request_id,
                transactions,
            }))
        }
        WireMessage::AchievementRequest(req) => {
            let achievement = store.achievement(&req.signature).await.ok()?;
            Some(WireMessage::AchievementResponse(AchievementResponse {
                request_id: req.request_id,
                achievement,
            }))
        }
        WireMessage::AchievementsRequest(req) => {
            let achievements = store.achievements_in_block(req.block_height).await.ok()?;
            Some(WireMessage::AchievementsResponse(AchievementsResponse {
                request_id: req.request_id,
                achievements,
            }))
        }
        WireMessage::ReviewRequest(req) => {
            let review = store.review(&req.signature).await.ok()?;
            Some(WireMessage::ReviewResponse(ReviewResponse {
                request_id: req.request_id,
                review,
            }))
        }
        WireMessage::ReviewsRequest(req) => {
            let reviews = store
                .reviews_for_achievement(&req.achievement_signature)
                .await
                .ok()?;
            Some(WireMessage::ReviewsResponse(ReviewsResponse {
                request_id: req.request_id,
                reviews,
            }))
        }
        other => {
            tracing::debug!(tag = other.tag(), "not a servable request");
            None
        }
    }
}

/// Build this node's signed chain-head announcement for a header.
fn chain_head_for(header: &BlockHeader, identity: &Identity, keypair: &MeritKeyPair) -> ChainHead {
    let mut head = ChainHead {
        height: header.height,
        hash: header.hash,
        publisher_address: identity.address,
        publisher_public_key: Some(identity.public_key),
        signature: None,
    };
    head.signature = keypair.sign(&head.signing_hash()).ok();
    head
}

/// Ask the relay who is in the room and pick the first full node.
async fn choose_sync_peer(sync: &mut SyncClient, relay: &dyn RelayTransport, room: &str) {
    match relay.room_members(room).await {
        Ok(members) => {
            let full_node = members.iter().find(|identity| {
                identity.role == NodeRole::Full && mc_03_validation::verify_identity(identity)
            });
            if let Some(identity) = full_node {
                tracing::info!(
                    peer = %shared_crypto::to_checksum_hex(&identity.address),
                    "chose sync peer"
                );
                sync.set_peer(identity.address);
            } else {
                tracing::info!("no full node in the room yet; waiting for CHAIN_HEAD gossip");
            }
        }
        Err(error) => {
            tracing::warn!(%error, "room membership query failed");
        }
    }
}

/// Build the block-range request that closes the gap to `target_height`.
fn catch_up_requests(
    sync: &mut SyncClient,
    target_height: u64,
    now_ms: u64,
) -> Vec<(Recipient, WireMessage)> {
    let Some(peer) = sync.peer() else {
        return Vec::new();
    };
    let local = sync.headers().height();
    if target_height <= local {
        return Vec::new();
    }
    let request = sync.request_blocks(local + 1, target_height - local, now_ms);
    vec![(Recipient::Node(peer), request)]
}
