//! # Sync Protocol (Subsystem 6)
//!
//! The lightweight-participant role: ingest deduplicated gossip and run
//! correlated request/response exchanges against a chosen sync peer,
//! trusting no single peer beyond what proofs and signatures establish.
//!
//! - Gossip is validated (signature + phase-appropriateness) and
//!   deduplicated against a bounded-lifetime cache; duplicates and
//!   invalid entities are dropped without error.
//! - Every solicited response must echo an outstanding `request_id` and
//!   is processed at most once.
//! - Account responses must carry a trie proof verifying against the
//!   accounts root of the locally known header for that height.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod gossip;
pub mod headers;
pub mod requests;
pub mod seen_cache;

pub use client::{SyncClient, SyncEvent};
pub use error::SyncError;
pub use gossip::GossipValidator;
pub use headers::HeaderChain;
pub use requests::{PendingRequests, RequestKind};
pub use seen_cache::SeenCache;
