//! Producer trait and the per-task context handed to producers

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::store::TaskStore;
use crate::types::{Event, TaskId};

/// A sitemap generation strategy
///
/// The executor selects one implementation per [`TaskType`](crate::types::TaskType)
/// and calls [`produce`](WorkProducer::produce) once per attempt. The same
/// producer also serves synchronous generation requests, in which case it
/// receives a [detached](TaskContext::detached) context.
///
/// # Examples
///
/// ```no_run
/// use sitemap_tasks::producers::{ManualProducer, TaskContext, WorkProducer};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let producer = ManualProducer;
/// let xml = producer
///     .produce(&json!({"urls": ["https://example.com/"]}), &TaskContext::detached())
///     .await?;
/// assert!(xml.contains("<loc>https://example.com/</loc>"));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait WorkProducer: Send + Sync {
    /// Build sitemap XML from the task's params
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`](crate::Error::InvalidInput) for params that
    ///   can never succeed (retrying is pointless)
    /// - [`Error::NotFound`](crate::Error::NotFound) for a missing scan directory
    /// - [`Error::Producer`](crate::Error::Producer) for any other failure
    async fn produce(
        &self,
        params: &serde_json::Value,
        ctx: &TaskContext,
    ) -> crate::Result<String>;

    /// Short name used in attempt log lines, e.g. "crawl"
    fn label(&self) -> &'static str;
}

/// Reporting handle given to a producer for one task
///
/// Progress and log writes go through the store's active-only guards, so
/// anything reported after the task became terminal is dropped.
#[derive(Clone)]
pub struct TaskContext {
    binding: Option<Binding>,
    cancel: CancellationToken,
}

#[derive(Clone)]
struct Binding {
    id: TaskId,
    store: Arc<TaskStore>,
    events: broadcast::Sender<Event>,
}

impl TaskContext {
    /// Context bound to a stored task
    pub fn new(
        id: TaskId,
        store: Arc<TaskStore>,
        events: broadcast::Sender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            binding: Some(Binding { id, store, events }),
            cancel,
        }
    }

    /// Context with no task behind it; reports are discarded
    pub fn detached() -> Self {
        Self {
            binding: None,
            cancel: CancellationToken::new(),
        }
    }

    /// The task this context reports for, if any
    pub fn task_id(&self) -> Option<&TaskId> {
        self.binding.as_ref().map(|b| &b.id)
    }

    /// Raise the task's progress (lower values are ignored by the store)
    pub async fn report_progress(&self, progress: u8) {
        let Some(binding) = &self.binding else {
            return;
        };
        match binding
            .store
            .update_if_active(&binding.id, crate::types::TaskPatch::progress(progress))
            .await
        {
            Ok(true) => {
                let event = Event::Progress {
                    id: binding.id.clone(),
                    progress,
                };
                binding.events.send(event).ok();
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(task_id = %binding.id, error = %e, "Failed to persist progress");
            }
        }
    }

    /// Append a line to the task's log
    pub async fn log(&self, message: &str) {
        let Some(binding) = &self.binding else {
            tracing::debug!(message, "Detached producer log");
            return;
        };
        if let Err(e) = binding.store.append_log_if_active(&binding.id, message).await {
            tracing::warn!(task_id = %binding.id, error = %e, "Failed to persist log line");
        }
    }

    /// Token cancelled when the watchdog fires or the service shuts down
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the task has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task_id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
