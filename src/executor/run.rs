//! Attempt loop for a single task run

use tokio_util::sync::CancellationToken;

use super::TaskExecutor;
use super::watchdog::Watchdog;
use crate::error::Result;
use crate::producers::TaskContext;
use crate::retry::{Backoff, IsRetryable};
use crate::types::{Event, TaskId, TaskPatch, TaskStatus};

/// Error and log text committed when shutdown interrupts a run
const SHUTDOWN_REASON: &str = "interrupted by shutdown";

/// Error committed when a run panics
const PANIC_REASON: &str = "internal error: task run panicked";

impl TaskExecutor {
    /// Drive a task from `pending` to a terminal state
    pub(super) async fn run(&self, id: &TaskId, token: CancellationToken) {
        let Some(task) = self.store.get(id).await else {
            tracing::warn!(task_id = %id, "Task vanished before it could start");
            return;
        };
        if task.status.is_terminal() {
            tracing::debug!(task_id = %id, status = %task.status, "Task already finished, not running");
            return;
        }

        let started = TaskPatch {
            status: Some(TaskStatus::Processing),
            progress: Some(10),
            ..Default::default()
        };
        if !self.committed(id, self.store.update_if_active(id, started).await) {
            return;
        }
        self.committed(id, self.store.append_log_if_active(id, "task started").await);
        self.emit(Event::Started { id: id.clone() });
        tracing::info!(task_id = %id, task_type = %task.task_type, "Task started");

        let _watchdog = Watchdog::arm(
            id.clone(),
            self.config.task_timeout,
            self.store.clone(),
            self.event_tx.clone(),
            token.clone(),
        );

        let producer = match self.producers.get(task.task_type) {
            Ok(producer) => producer,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "No producer for task type");
                self.fail(id, &e.to_string()).await;
                return;
            }
        };

        let ctx = TaskContext::new(
            id.clone(),
            self.store.clone(),
            self.event_tx.clone(),
            token.clone(),
        );
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = Backoff::new(&self.config.retry);

        for attempt in 1..=max_attempts {
            let line = format!("attempt {attempt} ({})", producer.label());
            if !self.committed(id, self.store.append_log_if_active(id, &line).await) {
                return;
            }
            self.emit(Event::AttemptStarted {
                id: id.clone(),
                attempt,
            });
            tracing::debug!(task_id = %id, attempt, max_attempts, "Attempt started");

            let outcome = tokio::select! {
                outcome = producer.produce(&task.params, &ctx) => outcome,
                _ = token.cancelled() => {
                    self.interrupted(id).await;
                    return;
                }
            };

            let error = match outcome {
                Ok(xml) => {
                    let committed = self.committed(
                        id,
                        self.store
                            .finish_if_active(id, TaskPatch::success(xml), "completed")
                            .await,
                    );
                    if committed {
                        tracing::info!(task_id = %id, attempt, "Task completed");
                        self.emit(Event::Completed { id: id.clone() });
                    }
                    return;
                }
                Err(e) => e,
            };

            let reason = error.to_string();
            let last = attempt == max_attempts || !error.is_retryable();

            let line = format!("attempt {attempt} failed: {reason}");
            if !self.committed(id, self.store.append_log_if_active(id, &line).await) {
                return;
            }
            let patch = TaskPatch {
                retry_count: Some(attempt),
                error: Some(reason.clone()),
                ..Default::default()
            };
            self.committed(id, self.store.update_if_active(id, patch).await);

            tracing::warn!(
                task_id = %id,
                attempt,
                max_attempts,
                retryable = error.is_retryable(),
                error = %error,
                "Attempt failed"
            );
            self.emit(Event::AttemptFailed {
                id: id.clone(),
                attempt,
                error: reason.clone(),
                will_retry: !last,
            });

            if last {
                self.fail(id, &reason).await;
                return;
            }

            let delay = backoff.next_delay();
            if !delay.is_zero() {
                tracing::debug!(task_id = %id, delay_ms = delay.as_millis(), "Waiting before next attempt");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {
                        self.interrupted(id).await;
                        return;
                    }
                }
            }
        }
    }

    /// Commit the final failure, keeping the last recorded error
    async fn fail(&self, id: &TaskId, reason: &str) {
        let patch = TaskPatch::fail(reason);
        if self.committed(id, self.store.finish_if_active(id, patch, "final failure").await) {
            tracing::error!(task_id = %id, error = %reason, "Task failed");
            self.emit(Event::Failed {
                id: id.clone(),
                error: reason.to_string(),
            });
        }
    }

    /// Fail a task whose run panicked
    pub(super) async fn panicked(&self, id: &TaskId) {
        tracing::error!(task_id = %id, "Task run panicked");
        self.fail(id, PANIC_REASON).await;
    }

    /// Handle cancellation of a running attempt
    ///
    /// A watchdog cancellation has already committed the timeout, so the
    /// commit below only lands when shutdown caused the cancellation.
    async fn interrupted(&self, id: &TaskId) {
        let patch = TaskPatch::fail(SHUTDOWN_REASON);
        if self.committed(id, self.store.finish_if_active(id, patch, SHUTDOWN_REASON).await) {
            tracing::warn!(task_id = %id, "Task interrupted by shutdown");
            self.emit(Event::Failed {
                id: id.clone(),
                error: SHUTDOWN_REASON.to_string(),
            });
        }
    }

    /// Whether a guarded store write took effect
    ///
    /// A persistence failure still leaves the in-memory record updated, so it
    /// counts as applied.
    fn committed(&self, id: &TaskId, result: Result<bool>) -> bool {
        match result {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "Failed to persist task state");
                true
            }
        }
    }
}
