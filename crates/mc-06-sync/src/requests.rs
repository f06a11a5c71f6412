//! # Pending-Request Table
//!
//! Tracks locally issued `*_REQUEST`s by correlation id. A response is
//! accepted only if its id matches an outstanding entry, and the entry
//! is removed on first match, giving at-most-once processing. Stale
//! entries are swept after a retention window (the peer never answered).

use shared_types::{Address, Signature};
use std::collections::HashMap;
use uuid::Uuid;

/// What a tracked request was asking for. Carried context (e.g. the
/// account address) lets response handling validate the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// An account plus proof.
    Account {
        /// The address the request was for.
        address: Address,
    },
    /// The peer's chain head.
    ChainHead,
    /// One header.
    BlockHeader {
        /// Requested height.
        height: u64,
    },
    /// A header range.
    BlockHeaders,
    /// One full block.
    Block {
        /// Requested height.
        height: u64,
    },
    /// A block range.
    Blocks,
    /// One transaction.
    Transaction {
        /// Requested signature.
        signature: Signature,
    },
    /// A block's transactions.
    Transactions,
    /// One achievement.
    Achievement {
        /// Requested signature.
        signature: Signature,
    },
    /// A block's achievements.
    Achievements,
    /// One review.
    Review {
        /// Requested signature.
        signature: Signature,
    },
    /// An achievement's reviews.
    Reviews,
}

#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    kind: RequestKind,
    issued_at_ms: u64,
}

/// The outstanding-request table.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: HashMap<Uuid, PendingEntry>,
    retention_ms: u64,
}

impl PendingRequests {
    /// Default retention for unanswered requests: thirty seconds.
    pub const DEFAULT_RETENTION_MS: u64 = 30_000;

    /// An empty table with the default retention.
    pub fn new() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION_MS)
    }

    /// An empty table with a custom retention.
    pub fn with_retention(retention_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            retention_ms,
        }
    }

    /// Track a freshly issued request.
    pub fn track(&mut self, request_id: Uuid, kind: RequestKind, now_ms: u64) {
        self.entries.insert(
            request_id,
            PendingEntry {
                kind,
                issued_at_ms: now_ms,
            },
        );
    }

    /// Claim the entry for an arriving response.
    ///
    /// Returns `None` for unknown or already-claimed ids; the caller
    /// drops such responses silently.
    pub fn take(&mut self, request_id: &Uuid) -> Option<RequestKind> {
        self.entries.remove(request_id).map(|entry| entry.kind)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict entries older than the retention window. Removal-only.
    pub fn sweep(&mut self, now_ms: u64) {
        let threshold = now_ms.saturating_sub(self.retention_ms);
        self.entries
            .retain(|_, entry| entry.issued_at_ms > threshold);
    }
}
