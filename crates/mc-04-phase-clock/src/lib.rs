//! # Phase Clock (Subsystem 4)
//!
//! The deterministic clock that synchronizes all participants without a
//! central authority: every node computes the current edition and phase
//! as a pure function of wall-clock time and the shared genesis instant.
//! No coordination message is required for phase agreement.
//!
//! An edition cycles through four contiguous, non-overlapping phases:
//! Submission → Review → Consensus → Announcement.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clock;
mod ticker;

pub use clock::{ClockError, EditionClock, EditionStatus, Phase, SystemTimeSource, TimeSource};
pub use ticker::{PhaseTicker, PhaseTransition};
