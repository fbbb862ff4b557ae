//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Background task submission and inspection
//! - [`sitemap`] - Synchronous generation
//! - [`system`] - Health, system info, events, OpenAPI

use serde::{Deserialize, Serialize};

mod sitemap;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` works
pub use sitemap::*;
pub use system::*;
pub use tasks::*;

use crate::types::TaskId;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitTaskRequest {
    /// Task type: "auto", "manual" or "local"
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    /// Producer parameters (a JSON object)
    #[schema(value_type = Object)]
    pub params: Option<serde_json::Value>,
}

/// Response for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskResponse {
    /// ID of the created task
    pub task_id: TaskId,
    /// Human-readable confirmation
    pub message: String,
}

/// Query parameters for GET /tasks
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Only tasks in this status
    pub status: Option<String>,
    /// Only tasks of this type
    #[serde(rename = "type")]
    pub task_type: Option<String>,
}

/// Response for DELETE /tasks/:id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskResponse {
    /// Human-readable confirmation
    pub message: String,
    /// ID of the removed task
    pub task_id: TaskId,
}
