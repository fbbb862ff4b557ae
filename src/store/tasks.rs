//! Task CRUD operations

use super::{TaskStore, snapshot};
use crate::error::Result;
use crate::types::{Task, TaskCounts, TaskFilter, TaskId, TaskPatch, TaskStatus, TaskType};
use crate::utils::{log_line, now_millis};

impl TaskStore {
    /// Insert a new pending task and persist it
    pub async fn create(&self, task_type: TaskType, params: serde_json::Value) -> Result<Task> {
        let now = now_millis();
        let task = Task {
            id: TaskId::generate(),
            task_type,
            params,
            status: TaskStatus::Pending,
            progress: 0,
            result: None,
            error: None,
            retry_count: 0,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut tasks = self.tasks.lock().await;
        tasks.insert(task.id.clone(), task.clone());

        if let Err(e) = snapshot::write(&self.path, &tasks).await {
            tasks.remove(&task.id);
            return Err(e);
        }

        tracing::debug!(task_id = %task.id, task_type = %task_type, "Task created");
        Ok(task)
    }

    /// Get a copy of a task
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.lock().await.get(id).cloned()
    }

    /// Merge a patch into a task and persist
    ///
    /// Unknown ids are ignored.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(());
        };
        apply_patch(task, patch);
        snapshot::write(&self.path, &tasks).await
    }

    /// Merge a patch only while the task is still non-terminal
    ///
    /// The check and the write happen under one lock acquisition. Returns
    /// `false` when the task is unknown or already terminal.
    pub async fn update_if_active(&self, id: &TaskId, patch: TaskPatch) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(false);
        };
        if task.status.is_terminal() {
            return Ok(false);
        }
        apply_patch(task, patch);
        snapshot::write(&self.path, &tasks).await?;
        Ok(true)
    }

    /// Append a timestamped line to a task's log and persist
    ///
    /// Unknown ids are ignored.
    pub async fn append_log(&self, id: &TaskId, message: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(());
        };
        task.log.push(log_line(message));
        task.updated_at = now_millis();
        snapshot::write(&self.path, &tasks).await
    }

    /// Append a log line only while the task is still non-terminal
    pub async fn append_log_if_active(&self, id: &TaskId, message: &str) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(false);
        };
        if task.status.is_terminal() {
            return Ok(false);
        }
        task.log.push(log_line(message));
        task.updated_at = now_millis();
        snapshot::write(&self.path, &tasks).await?;
        Ok(true)
    }

    /// Apply a terminal patch and its log line in one guarded write
    ///
    /// Used for every terminal commit so that exactly one of the competing
    /// outcomes (attempt result, watchdog, shutdown) wins.
    pub async fn finish_if_active(
        &self,
        id: &TaskId,
        patch: TaskPatch,
        message: &str,
    ) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(false);
        };
        if task.status.is_terminal() {
            return Ok(false);
        }
        apply_patch(task, patch);
        task.log.push(log_line(message));
        snapshot::write(&self.path, &tasks).await?;
        Ok(true)
    }

    /// List tasks matching the filter, newest first
    ///
    /// Tasks created in the same millisecond are ordered by id so the listing
    /// is stable between calls.
    pub async fn list(&self, filter: TaskFilter) -> Vec<Task> {
        let tasks = self.tasks.lock().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        matching
    }

    /// Remove a task and persist, returning the removed record
    pub async fn delete(&self, id: &TaskId) -> Result<Option<Task>> {
        let mut tasks = self.tasks.lock().await;
        let Some(removed) = tasks.remove(id) else {
            return Ok(None);
        };
        snapshot::write(&self.path, &tasks).await?;
        Ok(Some(removed))
    }

    /// Per-status totals
    pub async fn counts(&self) -> TaskCounts {
        let tasks = self.tasks.lock().await;
        let mut counts = TaskCounts {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks.values() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Processing => counts.processing += 1,
                TaskStatus::Success => counts.success += 1,
                TaskStatus::Fail => counts.fail += 1,
            }
        }
        counts
    }

    /// Fail every non-terminal task with `reason`, returning their ids
    ///
    /// Called once at startup: records still pending or processing were left
    /// behind by a previous process and no executor owns them anymore.
    pub async fn fail_unfinished(&self, reason: &str) -> Result<Vec<TaskId>> {
        let mut tasks = self.tasks.lock().await;
        let mut failed = Vec::new();

        for task in tasks.values_mut() {
            if task.status.is_terminal() {
                continue;
            }
            apply_patch(task, TaskPatch::fail(reason));
            task.log.push(log_line(reason));
            failed.push(task.id.clone());
        }

        if !failed.is_empty() {
            snapshot::write(&self.path, &tasks).await?;
        }
        Ok(failed)
    }
}

fn apply_patch(task: &mut Task, patch: TaskPatch) {
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(progress) = patch.progress {
        task.progress = task.progress.max(progress.min(100));
    }
    if let Some(result) = patch.result {
        task.result = Some(result);
    }
    if let Some(error) = patch.error {
        task.error = Some(error);
    }
    if let Some(retry_count) = patch.retry_count {
        task.retry_count = retry_count;
    }
    task.updated_at = now_millis();
}
