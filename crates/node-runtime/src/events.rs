//! # Node Events
//!
//! The typed event enum consumed by the single-consumer loop. Everything
//! that can touch node state arrives as one of these.

use mc_04_phase_clock::PhaseTransition;
use shared_types::{ReviewScores, RelayEnvelope, Signature};

/// A completed review result from the review producer, not yet wrapped
/// into a signed [`shared_types::Review`].
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// Content address of the reviewed achievement.
    pub achievement_signature: Signature,
    /// The produced scores.
    pub scores: ReviewScores,
    /// Free-text commentary.
    pub comment: String,
}

/// Everything the event loop can be woken by.
#[derive(Debug)]
pub enum NodeEvent {
    /// The phase ticker crossed a boundary.
    Phase(PhaseTransition),
    /// An inbound relay message (untrusted until validated).
    Inbound(RelayEnvelope),
    /// The review producer finished evaluating an achievement.
    ReviewCompleted(ReviewOutcome),
    /// Periodic cache/request-table sweep.
    Sweep,
}
