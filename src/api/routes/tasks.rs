//! Background task handlers.

use super::{DeleteTaskResponse, ListTasksQuery, SubmitTaskRequest, SubmitTaskResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{TaskFilter, TaskId, TaskList, TaskLog, TaskStatus, TaskStatusInfo, TaskType};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

/// POST /tasks - Submit a background generation task
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    request_body = SubmitTaskRequest,
    responses(
        (status = 202, description = "Task accepted", body = SubmitTaskResponse),
        (status = 400, description = "Missing or invalid type/params", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_task(
    State(state): State<AppState>,
    Json(request): Json<SubmitTaskRequest>,
) -> Result<impl IntoResponse> {
    let (Some(task_type), Some(params)) = (request.task_type, request.params) else {
        return Err(Error::InvalidInput("type and params are required".into()));
    };

    let task_id = state.service.submit_raw(&task_type, params).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitTaskResponse {
            task_id,
            message: "task created".to_string(),
        }),
    ))
}

/// GET /tasks - List tasks, newest first
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Matching tasks", body = TaskList),
        (status = 400, description = "Unknown status or type filter", body = crate::error::ApiError)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskList>> {
    let filter = TaskFilter {
        status: query
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        task_type: query
            .task_type
            .as_deref()
            .map(str::parse::<TaskType>)
            .transpose()?,
    };
    Ok(Json(state.service.list(filter).await))
}

/// GET /tasks/:id - Task status
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task status", body = TaskStatusInfo),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatusInfo>> {
    Ok(Json(state.service.get_status(&TaskId::from(id)).await?))
}

/// GET /tasks/:id/result - Sitemap XML of a successful task
#[utoipa::path(
    get,
    path = "/tasks/{id}/result",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Sitemap document", content_type = "application/xml", body = String),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 409, description = "Task has not succeeded", body = crate::error::ApiError)
    )
)]
pub async fn get_task_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let xml = state.service.get_result(&TaskId::from(id)).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

/// GET /tasks/:id/log - Task progress log
#[utoipa::path(
    get,
    path = "/tasks/{id}/log",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Ordered log lines", body = TaskLog),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_task_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskLog>> {
    Ok(Json(state.service.get_log(&TaskId::from(id)).await?))
}

/// DELETE /tasks/:id - Remove a finished task
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task removed", body = DeleteTaskResponse),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 409, description = "Task is still pending or processing", body = crate::error::ApiError)
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteTaskResponse>> {
    let task_id = TaskId::from(id);
    state.service.delete(&task_id).await?;
    Ok(Json(DeleteTaskResponse {
        message: "task deleted".to_string(),
        task_id,
    }))
}
