//! # Phase Ticker
//!
//! The sub-second periodic task that turns the pure clock into phase
//! transition events. Each node runs one ticker; its transitions drive
//! the consensus engine's state machine.

use crate::clock::{EditionClock, Phase, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A phase boundary crossing observed by the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// The edition the new phase belongs to.
    pub edition: u64,
    /// The phase just entered.
    pub phase: Phase,
}

/// Cancellable periodic phase-check task.
///
/// Emits one [`PhaseTransition`] on startup (the phase found on entry)
/// and one per boundary crossing thereafter. Stopping is idempotent and
/// safe to call from shutdown paths.
pub struct PhaseTicker {
    handle: Option<JoinHandle<()>>,
}

impl PhaseTicker {
    /// Spawn the ticker.
    ///
    /// Blocks (asynchronously) until genesis before the first emission.
    /// The task ends when the receiver side of `sender` is dropped.
    pub fn spawn(
        clock: EditionClock,
        time: Arc<dyn TimeSource>,
        tick: Duration,
        sender: mpsc::Sender<PhaseTransition>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            clock.wait_for_genesis(time.as_ref()).await;

            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last: Option<(u64, Phase)> = None;

            loop {
                interval.tick().await;

                let Ok(status) = clock.status(time.now_ms()) else {
                    // Clock rolled back before genesis; keep polling.
                    continue;
                };

                let current = (status.edition, status.phase);
                if last == Some(current) {
                    continue;
                }
                last = Some(current);

                tracing::debug!(
                    edition = status.edition,
                    phase = %status.phase,
                    "phase transition"
                );
                let transition = PhaseTransition {
                    edition: status.edition,
                    phase: status.phase,
                };
                if sender.send(transition).await.is_err() {
                    return;
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop the ticker. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PhaseTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemTimeSource;
    use shared_types::ChainParams;

    #[tokio::test]
    async fn test_ticker_emits_initial_phase() {
        let clock = EditionClock::new(&ChainParams::for_testing());
        let (tx, mut rx) = mpsc::channel(16);

        let mut ticker = PhaseTicker::spawn(
            clock,
            Arc::new(SystemTimeSource),
            Duration::from_millis(5),
            tx,
        );

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("ticker emitted nothing")
            .expect("channel closed");

        // Whatever phase we landed in, the clock agrees.
        let status = clock.status(SystemTimeSource.now_ms()).unwrap();
        assert_eq!(first.edition, status.edition);

        ticker.stop();
        ticker.stop(); // idempotent
    }

    #[tokio::test]
    async fn test_ticker_crosses_phase_boundaries() {
        let clock = EditionClock::new(&ChainParams::for_testing());
        let (tx, mut rx) = mpsc::channel(64);

        let _ticker = PhaseTicker::spawn(
            clock,
            Arc::new(SystemTimeSource),
            Duration::from_millis(5),
            tx,
        );

        let first = rx.recv().await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no second transition within an edition period")
            .unwrap();
        assert_ne!((first.edition, first.phase), (second.edition, second.phase));
    }
}
