//! Cross-subsystem integration tests.

mod candidate_competition;
mod edition_lifecycle;
mod light_sync;
