//! # Consensus Engine (Subsystem 5)
//!
//! The authoritative (full-node) role: a state machine driven by phase
//! transitions, one logical instance per edition.
//!
//! - **Submission start**: clear the edition's pending achievements
//! - **Review start**: clear the edition's pending reviews
//! - **Consensus start**: assemble a candidate from the pending pools,
//!   chain it to the head, start re-broadcasting
//! - **During Consensus**: adopt any fully valid peer candidate carrying
//!   strictly more total entries (ties keep the local one)
//! - **Announcement start**: persist the held candidate, apply account
//!   effects, advance the head, clear every pool
//!
//! An invalid peer candidate is silently discarded; a node that produces
//! no candidate simply waits for the next edition or a peer's block.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod engine;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod pools;
pub mod ports;
pub mod selection;

pub use assembler::BlockAssembler;
pub use engine::ConsensusEngine;
pub use error::ConsensusError;
pub use genesis::genesis_block;
pub use ledger::apply_block;
pub use pools::EditionPools;
pub use ports::LedgerStore;
pub use selection::CandidateTracker;
