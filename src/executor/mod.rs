//! Task executor: drives one task through its state machine
//!
//! `pending -> processing -> success | fail`
//!
//! Each run happens on its own tokio task. The executor:
//! - moves the task to `processing` and arms a wall-clock watchdog
//! - runs up to `max_attempts` sequential attempts through the task type's
//!   [`WorkProducer`](crate::producers::WorkProducer), waiting out the
//!   configured backoff between them
//! - commits exactly one terminal outcome
//!
//! Every terminal commit (attempt outcome, watchdog, shutdown) goes through
//! [`TaskStore::finish_if_active`], so whichever commits first wins and the
//! rest are no-ops.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ExecutorConfig;
use crate::error::{Error, Result, TaskError};
use crate::producers::ProducerSet;
use crate::store::TaskStore;
use crate::types::{Event, TaskId};

mod run;
mod watchdog;

/// Spawns and tracks task runs (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct TaskExecutor {
    store: Arc<TaskStore>,
    producers: Arc<ProducerSet>,
    config: Arc<ExecutorConfig>,
    event_tx: broadcast::Sender<Event>,
    /// Running tasks and their cancellation tokens
    active: Arc<Mutex<HashMap<TaskId, CancellationToken>>>,
    /// Parent of every per-task token; cancelled on shutdown
    shutdown: CancellationToken,
}

impl TaskExecutor {
    /// Create an executor over a store and a producer registry
    pub fn new(
        store: Arc<TaskStore>,
        producers: Arc<ProducerSet>,
        config: ExecutorConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            store,
            producers,
            config: Arc::new(config),
            event_tx,
            active: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start running a task in the background
    ///
    /// Returns immediately with the handle of the spawned run.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`cancel_all`](Self::cancel_all) was called
    /// - [`TaskError::InvalidState`] when the task is already running
    pub async fn spawn(&self, id: TaskId) -> Result<JoinHandle<()>> {
        if self.shutdown.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let token = {
            let mut active = self.active.lock().await;
            if active.contains_key(&id) {
                return Err(Error::Task(TaskError::InvalidState {
                    id: id.to_string(),
                    operation: "run".to_string(),
                    current_state: "processing".to_string(),
                }));
            }
            let token = self.shutdown.child_token();
            active.insert(id.clone(), token.clone());
            token
        };

        let executor = self.clone();
        let handle = tokio::spawn(async move {
            // A panic disarms the watchdog while unwinding, so the run must
            // commit its own failure and still leave the active set
            let outcome = AssertUnwindSafe(executor.run(&id, token)).catch_unwind().await;
            if outcome.is_err() {
                executor.panicked(&id).await;
            }
            executor.active.lock().await.remove(&id);
            tracing::debug!(task_id = %id, "Task run finished");
        });

        Ok(handle)
    }

    /// Whether a run for this task is in flight
    pub async fn is_active(&self, id: &TaskId) -> bool {
        self.active.lock().await.contains_key(id)
    }

    /// Number of runs in flight
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Refuse new runs and cancel every in-flight one
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    /// Wait until no run is in flight
    pub async fn wait_idle(&self) {
        loop {
            let active_count = self.active_count().await;
            if active_count == 0 {
                return;
            }
            tracing::debug!(active_count, "Waiting for active tasks to complete");
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
