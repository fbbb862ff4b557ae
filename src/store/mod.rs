//! Task store for sitemap-tasks
//!
//! Process-wide table of [`Task`] records backed by a single JSON snapshot file.
//!
//! ## Submodules
//!
//! Methods on [`TaskStore`] are organized by concern:
//! - [`tasks`] - Task CRUD, filtered listing and status counts
//! - [`snapshot`] - Loading and atomically rewriting the snapshot file
//!
//! Every mutating operation holds the table lock across the whole
//! read-modify-persist sequence, so readers always observe whole records and
//! the snapshot file has a single writer. Each mutation rewrites the full
//! file; this keeps the format trivially inspectable at the cost of O(n)
//! writes.

use crate::error::Result;
use crate::types::{Task, TaskId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

mod snapshot;
mod tasks;

/// File-backed task table
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskStore {
    /// Open the store, loading an existing snapshot
    ///
    /// A missing file yields an empty table. A file that exists but cannot be
    /// read or parsed is an error; it is never silently replaced.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = snapshot::load(&path).await?;

        tracing::info!(
            path = %path.display(),
            tasks = records.len(),
            "Task store opened"
        );

        let tasks = records
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();

        Ok(Self {
            path,
            tasks: Mutex::new(tasks),
        })
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
