//! Submitting, inspecting, listing and deleting tasks.

use std::sync::atomic::Ordering;

use super::SitemapService;
use crate::error::{Error, Result, TaskError};
use crate::types::{
    Event, TaskFilter, TaskId, TaskList, TaskLog, TaskPatch, TaskStatus, TaskStatusInfo,
    TaskSummary, TaskType,
};

impl SitemapService {
    /// Create a task and start running it in the background
    ///
    /// Returns as soon as the task is stored; poll [`get_status`](Self::get_status)
    /// or [`subscribe`](Self::subscribe) to follow it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] when `params` is not a JSON object
    /// - [`Error::ShuttingDown`] once shutdown has started
    pub async fn submit(&self, task_type: TaskType, params: serde_json::Value) -> Result<TaskId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if !params.is_object() {
            return Err(Error::InvalidInput("params must be an object".into()));
        }

        let task = self.store.create(task_type, params).await?;
        tracing::info!(task_id = %task.id, task_type = %task_type, "Task submitted");
        self.emit(Event::Submitted {
            id: task.id.clone(),
            task_type,
        });

        // The run is detached; its outcome lands in the store
        if let Err(e) = self.executor.spawn(task.id.clone()).await {
            tracing::error!(task_id = %task.id, error = %e, "Failed to start task");
            let patch = TaskPatch::fail(e.to_string());
            self.store
                .finish_if_active(&task.id, patch, "final failure")
                .await?;
            return Err(e);
        }

        Ok(task.id)
    }

    /// [`submit`](Self::submit) with the type given as its wire string
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a type other than auto/manual/local, plus
    /// everything [`submit`](Self::submit) returns.
    pub async fn submit_raw(&self, task_type: &str, params: serde_json::Value) -> Result<TaskId> {
        let task_type: TaskType = task_type.parse()?;
        self.submit(task_type, params).await
    }

    /// Status, progress, last error and retry count of a task
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] for an unknown id.
    pub async fn get_status(&self, id: &TaskId) -> Result<TaskStatusInfo> {
        let task = self.store.get(id).await.ok_or_else(|| not_found(id))?;
        Ok(TaskStatusInfo::from(&task))
    }

    /// Sitemap XML of a successful task
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] for an unknown id
    /// - [`TaskError::NotReady`] unless the task succeeded
    pub async fn get_result(&self, id: &TaskId) -> Result<String> {
        let task = self.store.get(id).await.ok_or_else(|| not_found(id))?;
        match (task.status, task.result) {
            (TaskStatus::Success, Some(xml)) => Ok(xml),
            (status, _) => Err(Error::Task(TaskError::NotReady {
                id: id.to_string(),
                status: status.to_string(),
            })),
        }
    }

    /// Ordered log lines of a task
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] for an unknown id.
    pub async fn get_log(&self, id: &TaskId) -> Result<TaskLog> {
        let task = self.store.get(id).await.ok_or_else(|| not_found(id))?;
        Ok(TaskLog {
            task_id: task.id,
            log: task.log,
        })
    }

    /// Summaries of matching tasks, newest first
    pub async fn list(&self, filter: TaskFilter) -> TaskList {
        let tasks: Vec<TaskSummary> = self
            .store
            .list(filter)
            .await
            .iter()
            .map(TaskSummary::from)
            .collect();
        TaskList {
            total: tasks.len(),
            tasks,
        }
    }

    /// Remove a finished task
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] for an unknown id
    /// - [`TaskError::InvalidState`] while the task is pending or processing
    pub async fn delete(&self, id: &TaskId) -> Result<()> {
        let task = self.store.get(id).await.ok_or_else(|| not_found(id))?;
        if !task.status.is_terminal() {
            return Err(Error::Task(TaskError::InvalidState {
                id: id.to_string(),
                operation: "delete".to_string(),
                current_state: task.status.to_string(),
            }));
        }

        if self.store.delete(id).await?.is_none() {
            return Err(not_found(id));
        }
        tracing::info!(task_id = %id, "Task deleted");
        self.emit(Event::Deleted { id: id.clone() });
        Ok(())
    }
}

fn not_found(id: &TaskId) -> Error {
    Error::Task(TaskError::NotFound { id: id.to_string() })
}
