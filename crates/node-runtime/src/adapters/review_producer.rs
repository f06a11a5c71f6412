//! # Review Producer Adapters
//!
//! Two stand-ins for the external review front end: a queue for test
//! harnesses that script outcomes by hand, and an auto-producer that
//! scores every assignment with a fixed rubric (demo networks).

use crate::events::{NodeEvent, ReviewOutcome};
use crate::ports::ReviewProducer;
use parking_lot::Mutex;
use shared_types::{Achievement, ReviewScores};
use tokio::sync::mpsc;

/// Records assignments for a test harness to complete manually.
#[derive(Default)]
pub struct QueueReviewProducer {
    assigned: Mutex<Vec<Achievement>>,
}

impl QueueReviewProducer {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything assigned so far.
    pub fn drain(&self) -> Vec<Achievement> {
        std::mem::take(&mut self.assigned.lock())
    }
}

impl ReviewProducer for QueueReviewProducer {
    fn assign(&self, achievement: Achievement) {
        self.assigned.lock().push(achievement);
    }
}

/// Completes every assignment immediately with fixed scores.
pub struct AutoReviewProducer {
    events: mpsc::Sender<NodeEvent>,
    scores: ReviewScores,
}

impl AutoReviewProducer {
    /// Build a producer feeding the node's event channel.
    pub fn new(events: mpsc::Sender<NodeEvent>, scores: ReviewScores) -> Self {
        Self { events, scores }
    }
}

impl ReviewProducer for AutoReviewProducer {
    fn assign(&self, achievement: Achievement) {
        let outcome = ReviewOutcome {
            achievement_signature: achievement.signature,
            scores: self.scores,
            comment: format!("auto-reviewed: {}", achievement.description),
        };
        // Best-effort: a stopped node just misses the outcome.
        let _ = self.events.try_send(NodeEvent::ReviewCompleted(outcome));
    }
}
