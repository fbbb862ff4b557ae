//! Wall-clock deadline for a task run

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::store::TaskStore;
use crate::types::{Event, TaskId, TaskPatch};

/// Handle to an armed watchdog; disarms when dropped
pub(super) struct Watchdog {
    disarm: CancellationToken,
}

impl Watchdog {
    /// Arm a watchdog for `id`
    ///
    /// When `timeout` elapses before the watchdog is disarmed, the task is
    /// failed with error "timeout" (if still non-terminal) and `task_token`
    /// is cancelled so the running producer can stop.
    pub(super) fn arm(
        id: TaskId,
        timeout: Duration,
        store: Arc<TaskStore>,
        event_tx: broadcast::Sender<Event>,
        task_token: CancellationToken,
    ) -> Self {
        let disarm = CancellationToken::new();
        let disarmed = disarm.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {}
                _ = disarmed.cancelled() => return,
            }

            match store
                .finish_if_active(&id, TaskPatch::fail("timeout"), "task timed out")
                .await
            {
                Ok(true) => {
                    tracing::warn!(task_id = %id, timeout_secs = timeout.as_secs(), "Task timed out");
                    event_tx.send(Event::TimedOut { id: id.clone() }).ok();
                }
                Ok(false) => {
                    tracing::debug!(task_id = %id, "Watchdog fired after task finished");
                }
                Err(e) => {
                    tracing::error!(task_id = %id, error = %e, "Failed to persist task timeout");
                    event_tx.send(Event::TimedOut { id: id.clone() }).ok();
                }
            }
            task_token.cancel();
        });

        Self { disarm }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.disarm.cancel();
    }
}
