//! # Inbound/Outbound Ports
//!
//! The external collaborators the core consumes. Implementations live in
//! [`crate::adapters`]; nothing in the core assumes more than these
//! signatures promise. The storage port is defined by the consensus
//! subsystem and re-exported here for adapter implementers.

use async_trait::async_trait;
use shared_types::{Achievement, Identity, RelayEnvelope};

pub use mc_05_consensus::LedgerStore;

/// Relay transport errors. The relay is best-effort: a failed send is
/// logged and the message forgotten, never retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay connection is gone.
    #[error("relay disconnected: {0}")]
    Disconnected(String),
}

/// The publish/subscribe relay carrying messages between peers.
///
/// Supports point-to-point sends and room-scoped broadcast; inbound
/// traffic arrives on the channel handed out at registration time, not
/// through this trait.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Send an envelope (point-to-point or room broadcast).
    async fn send(&self, envelope: RelayEnvelope) -> Result<(), RelayError>;

    /// The identities currently present in a room.
    async fn room_members(&self, room: &str) -> Result<Vec<Identity>, RelayError>;
}

/// The review-generation front end (automated or human).
///
/// The core hands achievements over and receives
/// [`crate::events::ReviewOutcome`]s asynchronously on the node's event
/// channel; how scores are produced is invisible here.
pub trait ReviewProducer: Send + Sync {
    /// Queue an achievement for evaluation.
    fn assign(&self, achievement: Achievement);
}
