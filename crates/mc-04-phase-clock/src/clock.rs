//! # Edition/Phase Computation
//!
//! Pure arithmetic over `elapsed = now - genesis`: the edition is
//! `elapsed / period`, and the position inside the edition selects one of
//! the four phase windows.

use shared_types::ChainParams;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Clock errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// The genesis instant has not been reached yet; callers block or
    /// poll until it passes.
    #[error("genesis is {remaining_ms} ms in the future")]
    BeforeGenesis {
        /// Milliseconds until genesis.
        remaining_ms: u64,
    },
}

/// The four phases of an edition, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Achievements (and transactions) are submitted.
    Submission,
    /// Reviews of this edition's achievements are submitted.
    Review,
    /// Full nodes assemble and exchange candidate blocks.
    Consensus,
    /// The winning candidate is finalized and announced.
    Announcement,
}

impl Phase {
    /// Lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Submission => "submission",
            Phase::Review => "review",
            Phase::Consensus => "consensus",
            Phase::Announcement => "announcement",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time reading of the phase clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditionStatus {
    /// The current edition number (0-based).
    pub edition: u64,
    /// The current phase within the edition.
    pub phase: Phase,
    /// Milliseconds until the current phase ends.
    pub phase_remaining_ms: u64,
    /// Milliseconds until the current edition ends.
    pub edition_remaining_ms: u64,
}

/// Source of wall-clock time, injectable for tests.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// The deterministic edition clock shared by all participants.
#[derive(Debug, Clone, Copy)]
pub struct EditionClock {
    genesis_ms: u64,
    submission_ms: u64,
    review_ms: u64,
    consensus_ms: u64,
    announcement_ms: u64,
}

impl EditionClock {
    /// Build the clock from the network's chain parameters.
    pub fn new(params: &ChainParams) -> Self {
        Self {
            genesis_ms: params.genesis_ms,
            submission_ms: params.submission_ms,
            review_ms: params.review_ms,
            consensus_ms: params.consensus_ms,
            announcement_ms: params.announcement_ms,
        }
    }

    /// One full edition in milliseconds.
    pub fn edition_period_ms(&self) -> u64 {
        self.submission_ms + self.review_ms + self.consensus_ms + self.announcement_ms
    }

    /// The genesis instant.
    pub fn genesis_ms(&self) -> u64 {
        self.genesis_ms
    }

    /// Compute the edition status at `now_ms`.
    ///
    /// # Errors
    ///
    /// `BeforeGenesis` until the genesis instant passes.
    pub fn status(&self, now_ms: u64) -> Result<EditionStatus, ClockError> {
        if now_ms < self.genesis_ms {
            return Err(ClockError::BeforeGenesis {
                remaining_ms: self.genesis_ms - now_ms,
            });
        }

        let period = self.edition_period_ms();
        let elapsed = now_ms - self.genesis_ms;
        let edition = elapsed / period;
        let into_edition = elapsed % period;

        let review_start = self.submission_ms;
        let consensus_start = review_start + self.review_ms;
        let announcement_start = consensus_start + self.consensus_ms;

        let (phase, phase_end) = if into_edition < review_start {
            (Phase::Submission, review_start)
        } else if into_edition < consensus_start {
            (Phase::Review, consensus_start)
        } else if into_edition < announcement_start {
            (Phase::Consensus, announcement_start)
        } else {
            (Phase::Announcement, period)
        };

        Ok(EditionStatus {
            edition,
            phase,
            phase_remaining_ms: phase_end - into_edition,
            edition_remaining_ms: period - into_edition,
        })
    }

    /// Poll until the genesis instant has passed.
    ///
    /// Pre-genesis is not an error condition for a starting node; it
    /// simply waits.
    pub async fn wait_for_genesis(&self, time: &dyn TimeSource) {
        loop {
            let now = time.now_ms();
            if now >= self.genesis_ms {
                return;
            }
            let remaining = self.genesis_ms - now;
            tracing::info!(remaining_ms = remaining, "waiting for genesis");
            let nap = remaining.min(1_000);
            tokio::time::sleep(std::time::Duration::from_millis(nap)).await;
        }
    }
}
