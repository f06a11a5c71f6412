//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors surfaced by a ledger store backend.
///
/// Store failures abort the calling operation (e.g. finalization skips the
/// edition) but never take down the phase clock or networking.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested block/entity is not stored.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend is unreachable or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored record failed an integrity check on read.
    #[error("Data corruption: {0}")]
    Corrupted(String),

    /// A block write would break the chain invariant.
    #[error("Block at height {height} does not extend the stored chain")]
    NotSequential {
        /// The offending height.
        height: u64,
    },
}
