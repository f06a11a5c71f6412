//! # Shared Types Crate
//!
//! This crate contains all domain entities, the network-wide chain
//! parameters, the signing-preimage conventions, and the relay wire
//! protocol.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Fail-Closed Decoding**: Inbound traffic decodes into the tagged
//!   [`protocol::WireMessage`] enum before any typed code sees it.
//! - **Fixed Preimages**: The byte-exact signing rendering in [`signing`]
//!   is consistency-critical across all nodes.

pub mod entities;
pub mod errors;
pub mod params;
pub mod protocol;
pub mod signing;

pub use entities::*;
pub use errors::*;
pub use params::ChainParams;
pub use protocol::{gossip_dedup_key, Recipient, RelayEnvelope, WireMessage};
