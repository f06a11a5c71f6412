//! Sync error types.

use thiserror::Error;

/// Failures in header-chain maintenance.
///
/// Protocol desync (stale responses, non-extending blocks) is not an
/// error: those messages are dropped silently per the error-handling
/// policy. These variants exist for the header chain's own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A header does not continue the chain's heights gap-free.
    #[error("non-sequential header: expected height {expected}, got {got}")]
    NonSequentialHeader {
        /// The height the chain expects next.
        expected: u64,
        /// The height actually offered.
        got: u64,
    },

    /// A header's `previous_hash` does not match the tip.
    #[error("header at height {height} does not link to the tip")]
    BrokenLink {
        /// The offending height.
        height: u64,
    },

    /// A header's stored hash does not recompute.
    #[error("header at height {height} fails self-verification")]
    InvalidHeader {
        /// The offending height.
        height: u64,
    },
}
