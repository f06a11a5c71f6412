//! # Port Adapters
//!
//! In-process implementations of the external-collaborator ports: an
//! in-memory ledger store, a loopback relay hub for wiring nodes inside
//! one process (tests, demos), and review-producer adapters.

mod codec;
mod loopback;
mod memory_store;
mod review_producer;

pub use codec::{decode_envelope, encode_envelope};
pub use loopback::{LoopbackHub, LoopbackRelay};
pub use memory_store::MemoryLedgerStore;
pub use review_producer::{AutoReviewProducer, QueueReviewProducer};
