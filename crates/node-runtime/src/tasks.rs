//! # Repeating Tasks
//!
//! Cancellable periodic broadcasts bound to the node's lifetime.
//! Stopping is idempotent and safe from shutdown paths; a dropped handle
//! stops its task.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to a periodic background task.
pub struct RepeatingTask {
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Spawn a task running `action` every `period`.
    ///
    /// The first run happens after one full period, matching a broadcast
    /// that announces state which was already sent once at creation.
    pub fn spawn<F, Fut>(period: Duration, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // Consume the immediate first tick.
            interval.tick().await;
            loop {
                interval.tick().await;
                action().await;
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Stop the task. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_task_repeats_until_stopped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);

        let mut task = RepeatingTask::spawn(Duration::from_millis(10), move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected repeated runs, got {after_stop}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);

        task.stop(); // idempotent
    }
}
