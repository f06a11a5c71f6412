//! # Candidate Selection
//!
//! The greedy "biggest wins" rule for competing candidates during the
//! Consensus phase: a fully valid, previously unseen candidate replaces
//! the held one iff it carries strictly more total entries. Exact ties
//! keep the currently held candidate, so arrival order cannot flap the
//! choice.

use shared_types::{Block, Hash};
use std::collections::HashSet;

/// Tracks the held candidate and the header hashes already considered.
#[derive(Debug, Default)]
pub struct CandidateTracker {
    local: Option<Block>,
    seen: HashSet<Hash>,
}

impl CandidateTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the candidate and the seen set (edition end).
    pub fn reset(&mut self) {
        self.local = None;
        self.seen.clear();
    }

    /// The currently held candidate.
    pub fn local(&self) -> Option<&Block> {
        self.local.as_ref()
    }

    /// Take the held candidate out (finalization).
    pub fn take_local(&mut self) -> Option<Block> {
        self.local.take()
    }

    /// Install our own assembled candidate.
    pub fn set_local(&mut self, candidate: Block) {
        self.seen.insert(candidate.header.hash);
        self.local = Some(candidate);
    }

    /// Consider an already-verified peer candidate.
    ///
    /// Returns true when the peer candidate was adopted. Duplicates (by
    /// header hash) and candidates without a strict size advantage are
    /// ignored.
    pub fn consider(&mut self, candidate: Block) -> bool {
        if !self.seen.insert(candidate.header.hash) {
            return false;
        }

        let adopt = match &self.local {
            Some(current) => candidate.total_entries() > current.total_entries(),
            None => true,
        };

        if adopt {
            tracing::info!(
                height = candidate.header.height,
                entries = candidate.total_entries(),
                "adopting larger peer candidate"
            );
            self.local = Some(candidate);
        }
        adopt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockHeader, Transaction};

    /// A block carrying `entries` placeholder transactions.
    fn candidate(tag: u8, entries: usize) -> Block {
        let transactions = (0..entries)
            .map(|i| Transaction {
                sender_address: [0x11; 20],
                recipient_address: [0x22; 20],
                amount: 1,
                nonce: i as u64,
                timestamp_ms: 0,
                sender_public_key: [0x02; 33],
                signature: [i as u8; 64],
                block_height: Some(2),
            })
            .collect();
        Block {
            header: BlockHeader {
                height: 2,
                hash: [tag; 32],
                ..BlockHeader::default()
            },
            transactions,
            achievements: vec![],
            reviews: vec![],
        }
    }

    #[test]
    fn test_larger_candidate_wins_either_order() {
        // 7 then 5: keep 7.
        let mut tracker = CandidateTracker::new();
        tracker.set_local(candidate(1, 7));
        assert!(!tracker.consider(candidate(2, 5)));
        assert_eq!(tracker.local().unwrap().total_entries(), 7);

        // 5 then 7: adopt 7.
        let mut tracker = CandidateTracker::new();
        tracker.set_local(candidate(1, 5));
        assert!(tracker.consider(candidate(2, 7)));
        assert_eq!(tracker.local().unwrap().total_entries(), 7);
    }

    #[test]
    fn test_exact_tie_keeps_local() {
        let mut tracker = CandidateTracker::new();
        tracker.set_local(candidate(1, 5));
        assert!(!tracker.consider(candidate(2, 5)));
        assert_eq!(tracker.local().unwrap().header.hash, [1; 32]);
    }

    #[test]
    fn test_duplicate_header_hash_ignored() {
        let mut tracker = CandidateTracker::new();
        tracker.set_local(candidate(1, 2));
        assert!(tracker.consider(candidate(2, 5)));
        // Same header hash again, even larger: still ignored.
        assert!(!tracker.consider(candidate(2, 9)));
    }

    #[test]
    fn test_first_peer_candidate_fills_empty_tracker() {
        let mut tracker = CandidateTracker::new();
        assert!(tracker.consider(candidate(1, 0)));
        assert!(tracker.local().is_some());
    }

    #[test]
    fn test_reset_clears_seen_set() {
        let mut tracker = CandidateTracker::new();
        tracker.set_local(candidate(1, 2));
        tracker.reset();
        assert!(tracker.local().is_none());
        assert!(tracker.consider(candidate(1, 2)));
    }
}
