//! Core types for sitemap-tasks

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Error;

/// Unique identifier for a task (UUID v4 string)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input mode of a task, selecting the work producer that runs it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Recursive crawl from a start URL
    Auto,
    /// Explicit list of URLs
    Manual,
    /// Scan of a local directory tree
    Local,
}

impl TaskType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Auto => "auto",
            TaskType::Manual => "manual",
            TaskType::Local => "local",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(TaskType::Auto),
            "manual" => Ok(TaskType::Manual),
            "local" => Ok(TaskType::Local),
            _ => Err(Error::InvalidInput(
                "type must be one of auto/manual/local".to_string(),
            )),
        }
    }
}

/// Task lifecycle status
///
/// Transitions only move forward: `pending -> processing -> success | fail`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, not yet picked up by an executor
    Pending,
    /// An executor is running attempts
    Processing,
    /// Finished with a result
    Success,
    /// Finished without a result
    Fail,
}

impl TaskStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Fail)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Success => "success",
            TaskStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "success" => Ok(TaskStatus::Success),
            "fail" => Ok(TaskStatus::Fail),
            other => Err(Error::InvalidInput(format!(
                "unknown status '{other}', expected one of pending/processing/success/fail"
            ))),
        }
    }
}

/// A unit of sitemap generation work and its evolving state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique, immutable identifier
    pub id: TaskId,

    /// Input mode
    #[serde(rename = "type")]
    pub task_type: TaskType,

    /// Type-specific payload, stored as submitted
    #[schema(value_type = Object)]
    pub params: serde_json::Value,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Completion percentage (0-100, never decreases)
    pub progress: u8,

    /// Sitemap XML, present only when `status` is `success`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Most recent error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Number of failed attempts so far
    #[serde(default)]
    pub retry_count: u32,

    /// Timestamped progress log, oldest first
    #[serde(default)]
    pub log: Vec<String>,

    /// Creation time (Unix epoch milliseconds)
    pub created_at: i64,

    /// Last mutation time (Unix epoch milliseconds)
    pub updated_at: i64,
}

/// Partial update applied to a stored task
///
/// `None` fields are left untouched. A progress value lower than the stored
/// one is ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskPatch {
    /// New status
    pub status: Option<TaskStatus>,
    /// New progress
    pub progress: Option<u8>,
    /// Result XML
    pub result: Option<String>,
    /// Error message
    pub error: Option<String>,
    /// Failed attempt count
    pub retry_count: Option<u32>,
}

impl TaskPatch {
    /// Patch that only moves progress forward
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// Patch for a successful terminal commit
    pub fn success(result: String) -> Self {
        Self {
            status: Some(TaskStatus::Success),
            progress: Some(100),
            result: Some(result),
            ..Default::default()
        }
    }

    /// Patch for a failed terminal commit
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Fail),
            progress: Some(100),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Equality filters for listing tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks in this status
    pub status: Option<TaskStatus>,
    /// Only tasks of this type
    pub task_type: Option<TaskType>,
}

impl TaskFilter {
    /// Whether the task passes every set filter
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.task_type.is_none_or(|t| task.task_type == t)
    }
}

/// Status snapshot returned to polling clients
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusInfo {
    /// Task ID
    pub task_id: TaskId,
    /// Task type
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Current status
    pub status: TaskStatus,
    /// Completion percentage
    pub progress: u8,
    /// Most recent error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failed attempt count
    pub retry_count: u32,
    /// Creation time (Unix epoch milliseconds)
    pub created_at: i64,
    /// Last mutation time (Unix epoch milliseconds)
    pub updated_at: i64,
}

impl From<&Task> for TaskStatusInfo {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            task_type: task.task_type,
            status: task.status,
            progress: task.progress,
            error: task.error.clone(),
            retry_count: task.retry_count,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// One row of a task listing (no params, result or log)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Task ID
    pub id: TaskId,
    /// Task type
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Current status
    pub status: TaskStatus,
    /// Completion percentage
    pub progress: u8,
    /// Most recent error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failed attempt count
    pub retry_count: u32,
    /// Creation time (Unix epoch milliseconds)
    pub created_at: i64,
    /// Last mutation time (Unix epoch milliseconds)
    pub updated_at: i64,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            task_type: task.task_type,
            status: task.status,
            progress: task.progress,
            error: task.error.clone(),
            retry_count: task.retry_count,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Task listing with its total count
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskList {
    /// Matching tasks, newest first
    pub tasks: Vec<TaskSummary>,
    /// Number of matching tasks
    pub total: usize,
}

/// Progress log of a task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    /// Task ID
    pub task_id: TaskId,
    /// Timestamped log lines, oldest first
    pub log: Vec<String>,
}

/// Per-status task totals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskCounts {
    /// Tasks waiting to start
    pub pending: usize,
    /// Tasks currently running
    pub processing: usize,
    /// Tasks that finished with a result
    pub success: usize,
    /// Tasks that finished without a result
    pub fail: usize,
    /// All tasks
    pub total: usize,
}

/// Service health report
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    /// Always "ok" while the service answers
    pub status: String,
    /// Report time (RFC 3339)
    pub timestamp: String,
    /// Crate version
    pub version: String,
    /// Seconds since the service started
    pub uptime_secs: u64,
    /// Task totals by status
    pub tasks: TaskCounts,
    /// Whether shutdown has begun
    pub shutting_down: bool,
}

/// Host and process information
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Crate version
    pub version: String,
    /// Operating system (e.g. "linux")
    pub os: String,
    /// CPU architecture (e.g. "x86_64")
    pub arch: String,
    /// Available parallelism
    pub cpus: usize,
    /// Seconds since the service started
    pub uptime_secs: u64,
}

/// Optional per-entry tags emitted in every `<url>` element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SitemapOptions {
    /// Change frequency (e.g. "daily")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,
    /// Priority between 0.0 and 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    /// Last modification date (e.g. "2024-01-31")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// Parameters of a `manual` task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualParams {
    /// Page URLs, emitted in order
    pub urls: Vec<String>,
    /// Shared tag options
    #[serde(flatten)]
    pub options: SitemapOptions,
}

/// Parameters of an `auto` (crawl) task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoParams {
    /// Absolute http(s) start URL
    pub url: String,
    /// Link hops to follow from the start page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    /// Shared tag options
    #[serde(flatten)]
    pub options: SitemapOptions,
}

/// Parameters of a `local` (directory scan) task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalParams {
    /// Directory to walk
    pub dir_path: String,
    /// URL prefix joined with each page file name
    pub base_url: String,
    /// Shared tag options
    #[serde(flatten)]
    pub options: SitemapOptions,
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created and handed to the executor
    Submitted {
        /// Task ID
        id: TaskId,
        /// Task type
        task_type: TaskType,
    },

    /// Executor moved the task to processing
    Started {
        /// Task ID
        id: TaskId,
    },

    /// An attempt began
    AttemptStarted {
        /// Task ID
        id: TaskId,
        /// 1-based attempt number
        attempt: u32,
    },

    /// An attempt failed
    AttemptFailed {
        /// Task ID
        id: TaskId,
        /// 1-based attempt number
        attempt: u32,
        /// Failure reason
        error: String,
        /// Whether another attempt follows
        will_retry: bool,
    },

    /// Producer reported progress
    Progress {
        /// Task ID
        id: TaskId,
        /// Completion percentage
        progress: u8,
    },

    /// Task finished with a result
    Completed {
        /// Task ID
        id: TaskId,
    },

    /// Task finished without a result
    Failed {
        /// Task ID
        id: TaskId,
        /// Final error message
        error: String,
    },

    /// Watchdog ended the task
    TimedOut {
        /// Task ID
        id: TaskId,
    },

    /// Task removed from the store
    Deleted {
        /// Task ID
        id: TaskId,
    },

    /// Service shutdown finished
    Shutdown,
}
