//! # Chain Parameters
//!
//! Network-wide constants every participant must agree on. Local,
//! per-node settings live in the node runtime's own config instead.

use serde::{Deserialize, Serialize};

/// Network-wide consensus parameters.
///
/// All participants compute editions and phases from the same
/// `genesis_ms` and phase durations, so phase agreement needs no
/// coordination messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Chain identifier, embedded in identities.
    pub chain_id: String,
    /// Genesis instant, milliseconds since the Unix epoch.
    pub genesis_ms: u64,
    /// Length of the Submission phase in milliseconds.
    pub submission_ms: u64,
    /// Length of the Review phase in milliseconds.
    pub review_ms: u64,
    /// Length of the Consensus phase in milliseconds.
    pub consensus_ms: u64,
    /// Length of the Announcement phase in milliseconds.
    pub announcement_ms: u64,
    /// Minimum distinct reviewers before an achievement can be accepted.
    pub min_reviewers_per_achievement: usize,
    /// Minimum median `overall` score for acceptance.
    pub accept_threshold: u8,
    /// Credit to an achievement author on acceptance, base units.
    pub achievement_reward: u64,
    /// Credit to a reviewer whose review is included, base units.
    pub review_reward: u64,
}

impl ChainParams {
    /// One full edition in milliseconds (the four phases are contiguous
    /// and non-overlapping, covering the whole period).
    pub fn edition_period_ms(&self) -> u64 {
        self.submission_ms + self.review_ms + self.consensus_ms + self.announcement_ms
    }

    /// Parameters for tests: millisecond-scale phases, genesis at 0.
    pub fn for_testing() -> Self {
        Self {
            chain_id: "merit-test".to_string(),
            genesis_ms: 0,
            submission_ms: 400,
            review_ms: 300,
            consensus_ms: 200,
            announcement_ms: 100,
            min_reviewers_per_achievement: 1,
            accept_threshold: 3,
            achievement_reward: 50,
            review_reward: 5,
        }
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            chain_id: "merit-main".to_string(),
            genesis_ms: 1_735_689_600_000, // 2025-01-01T00:00:00Z
            submission_ms: 300_000,
            review_ms: 240_000,
            consensus_ms: 45_000,
            announcement_ms: 15_000,
            min_reviewers_per_achievement: 3,
            accept_threshold: 3,
            achievement_reward: 50,
            review_reward: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_edition_period() {
        let params = ChainParams::default();
        assert_eq!(params.edition_period_ms(), 600_000);
    }

    #[test]
    fn test_testing_params_cover_period() {
        let params = ChainParams::for_testing();
        assert_eq!(params.edition_period_ms(), 1000);
        assert_eq!(params.min_reviewers_per_achievement, 1);
    }
}
