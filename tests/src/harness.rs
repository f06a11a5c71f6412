//! Shared helpers: a scripted relay client and node spawning.

use node_runtime::adapters::{LoopbackHub, MemoryLedgerStore};
use node_runtime::config::NodeConfig;
use node_runtime::identity::create_identity;
use node_runtime::runtime::NodeRuntime;
use rand::Rng;
use shared_crypto::MeritKeyPair;
use shared_types::{
    Achievement, Address, ChainHead, Identity, NodeRole, Recipient, RelayEnvelope, Review,
    ReviewScores, Transaction, WireMessage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Sleep until a wall-clock instant (no-op when already past).
pub async fn sleep_until_ms(target_ms: u64) {
    let now = now_ms();
    if target_ms > now {
        tokio::time::sleep(Duration::from_millis(target_ms - now)).await;
    }
}

/// A running node plus the handles the tests observe it through.
pub struct SpawnedNode {
    pub address: Address,
    pub head: watch::Receiver<Option<ChainHead>>,
    pub shutdown: watch::Sender<bool>,
}

/// Spawn a node on the hub. The seed is pinned so the registered
/// identity matches the one the runtime derives.
pub async fn spawn_node(mut config: NodeConfig, hub: &Arc<LoopbackHub>) -> SpawnedNode {
    if config.seed_hex.is_none() {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed);
        config.seed_hex = Some(hex::encode(seed));
    }

    let (_keypair, identity) = create_identity(&config).expect("identity");
    let address = identity.address;
    let (relay, inbox) = hub.register(identity, &config.room);
    let store = Arc::new(MemoryLedgerStore::new());

    let runtime = NodeRuntime::new(config, Arc::new(relay), store)
        .await
        .expect("node bootstrap");
    runtime.attach_inbound(inbox);
    let head = runtime.head_subscription();

    let (shutdown, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = runtime.run(shutdown_rx).await;
    });

    SpawnedNode {
        address,
        head,
        shutdown,
    }
}

/// A scripted relay participant that signs and injects entities and
/// observes broadcast traffic.
pub struct TestClient {
    pub keypair: MeritKeyPair,
    pub identity: Identity,
    relay: node_runtime::adapters::LoopbackRelay,
    inbox: mpsc::Receiver<RelayEnvelope>,
    room: String,
}

impl TestClient {
    /// Join the hub under a fresh identity.
    pub fn join(hub: &Arc<LoopbackHub>, room: &str, chain_id: &str) -> Self {
        let keypair = MeritKeyPair::generate();
        let mut identity = Identity {
            chain_id: chain_id.to_string(),
            display_name: "test-client".to_string(),
            address: keypair.address(),
            role: NodeRole::Light,
            public_key: keypair.public_key(),
            signature: [0u8; 64],
        };
        identity.signature = keypair.sign(&identity.signing_hash()).unwrap();

        let (relay, inbox) = hub.register(identity.clone(), room);
        Self {
            keypair,
            identity,
            relay,
            inbox,
            room: room.to_string(),
        }
    }

    pub async fn broadcast(&self, message: WireMessage) {
        self.send(Recipient::Broadcast, message).await;
    }

    pub async fn send_to(&self, to: Address, message: WireMessage) {
        self.send(Recipient::Node(to), message).await;
    }

    async fn send(&self, to: Recipient, message: WireMessage) {
        use node_runtime::ports::RelayTransport;
        self.relay
            .send(RelayEnvelope {
                from: self.identity.address,
                to,
                room: Some(self.room.clone()),
                message,
                timestamp_ms: now_ms(),
            })
            .await
            .expect("loopback send");
    }

    /// Wait for the first inbound message matching `select`.
    pub async fn wait_for<T>(
        &mut self,
        timeout: Duration,
        select: impl Fn(&WireMessage) -> Option<T>,
    ) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let envelope = tokio::time::timeout_at(deadline, self.inbox.recv())
                .await
                .ok()??;
            if let Some(found) = select(&envelope.message) {
                return Some(found);
            }
        }
    }

    /// A signed achievement from this client.
    pub fn achievement(&self, target_edition: u64, description: &str) -> Achievement {
        let mut achievement = Achievement {
            target_edition,
            author_name: self.identity.display_name.clone(),
            author_address: self.identity.address,
            description: description.to_string(),
            attachment_ref: None,
            timestamp_ms: now_ms(),
            author_public_key: self.identity.public_key,
            signature: [0u8; 64],
        };
        achievement.signature = self.keypair.sign(&achievement.signing_hash()).unwrap();
        achievement
    }

    /// A signed review of `of` from this client.
    pub fn review(&self, of: &Achievement, overall: u8) -> Review {
        let mut review = Review {
            target_edition: of.target_edition,
            achievement_signature: of.signature,
            reviewer_name: self.identity.display_name.clone(),
            reviewer_address: self.identity.address,
            scores: ReviewScores {
                overall,
                originality: overall,
                creativity: overall,
                relevance: overall,
                presentation: overall,
            },
            comment: "verified in person".to_string(),
            reviewer_public_key: self.identity.public_key,
            timestamp_ms: now_ms(),
            signature: [0u8; 64],
        };
        review.signature = self.keypair.sign(&review.signing_hash()).unwrap();
        review
    }

    /// A signed transfer from this client.
    pub fn transaction(&self, to: Address, amount: u64) -> Transaction {
        let mut tx = Transaction {
            sender_address: self.identity.address,
            recipient_address: to,
            amount,
            nonce: 0,
            timestamp_ms: now_ms(),
            sender_public_key: self.identity.public_key,
            signature: [0u8; 64],
            block_height: None,
        };
        tx.signature = self.keypair.sign(&tx.signing_hash()).unwrap();
        tx
    }
}
