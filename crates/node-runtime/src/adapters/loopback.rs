//! # Loopback Relay
//!
//! An in-process relay hub for tests and multi-node demos: registered
//! peers get an inbox channel, sends route point-to-point by address or
//! fan out room-wide (excluding the sender). Delivery is best-effort,
//! exactly like the real transport: a full or closed inbox drops the
//! message.

use crate::ports::{RelayError, RelayTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, Identity, Recipient, RelayEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;

const INBOX_CAPACITY: usize = 256;

struct Peer {
    identity: Identity,
    room: String,
    inbox: mpsc::Sender<RelayEnvelope>,
}

/// The shared hub all loopback relays route through.
#[derive(Default)]
pub struct LoopbackHub {
    peers: Mutex<Vec<Peer>>,
}

impl LoopbackHub {
    /// A fresh hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a peer; returns its relay handle and inbox.
    pub fn register(
        self: &Arc<Self>,
        identity: Identity,
        room: &str,
    ) -> (LoopbackRelay, mpsc::Receiver<RelayEnvelope>) {
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let address = identity.address;
        self.peers.lock().push(Peer {
            identity,
            room: room.to_string(),
            inbox: inbox_tx,
        });
        (
            LoopbackRelay {
                hub: Arc::clone(self),
                address,
            },
            inbox_rx,
        )
    }

    fn route(&self, envelope: RelayEnvelope) {
        let peers = self.peers.lock();
        match envelope.to {
            Recipient::Node(address) => {
                if let Some(peer) = peers.iter().find(|p| p.identity.address == address) {
                    // Best-effort: a full inbox drops the message.
                    let _ = peer.inbox.try_send(envelope);
                }
            }
            Recipient::Broadcast => {
                let room = envelope.room.as_deref().unwrap_or_default();
                for peer in peers
                    .iter()
                    .filter(|p| p.room == room && p.identity.address != envelope.from)
                {
                    let _ = peer.inbox.try_send(envelope.clone());
                }
            }
        }
    }

    fn members(&self, room: &str) -> Vec<Identity> {
        self.peers
            .lock()
            .iter()
            .filter(|p| p.room == room)
            .map(|p| p.identity.clone())
            .collect()
    }
}

/// One peer's handle onto the hub.
pub struct LoopbackRelay {
    hub: Arc<LoopbackHub>,
    address: Address,
}

impl LoopbackRelay {
    /// The address this handle sends as.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl RelayTransport for LoopbackRelay {
    async fn send(&self, envelope: RelayEnvelope) -> Result<(), RelayError> {
        self.hub.route(envelope);
        Ok(())
    }

    async fn room_members(&self, room: &str) -> Result<Vec<Identity>, RelayError> {
        Ok(self.hub.members(room))
    }
}
