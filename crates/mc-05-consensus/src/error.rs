//! Consensus error types.

use shared_types::StoreError;
use thiserror::Error;

/// Failures surfaced by the consensus engine.
///
/// These are local resource failures (taxonomy class c): the calling
/// operation aborts for the edition, the phase clock and networking stay
/// alive. Adversarial input never produces an error, only a dropped
/// message.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The ledger store refused an operation.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// The chain has no head where one is required.
    #[error("chain has no head")]
    MissingHead,
}
