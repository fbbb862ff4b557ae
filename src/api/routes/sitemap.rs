//! Synchronous generation handlers.
//!
//! Each handler runs one producer inline and answers with the XML; nothing is
//! stored.

use crate::api::AppState;
use crate::error::Result;
use crate::types::TaskType;
use axum::{Json, extract::State, http::header, response::IntoResponse};

async fn generate(
    state: AppState,
    task_type: TaskType,
    body: serde_json::Value,
) -> Result<impl IntoResponse> {
    let xml = state.service.generate_now(task_type, &body).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

/// POST /sitemap - Render an explicit URL list
#[utoipa::path(
    post,
    path = "/sitemap",
    tag = "sitemap",
    request_body = crate::types::ManualParams,
    responses(
        (status = 200, description = "Sitemap document", content_type = "application/xml", body = String),
        (status = 400, description = "Missing or empty urls", body = crate::error::ApiError)
    )
)]
pub async fn generate_manual(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse> {
    generate(state, TaskType::Manual, body).await
}

/// POST /sitemap/crawl - Crawl a site and render the pages found
#[utoipa::path(
    post,
    path = "/sitemap/crawl",
    tag = "sitemap",
    request_body = crate::types::AutoParams,
    responses(
        (status = 200, description = "Sitemap document", content_type = "application/xml", body = String),
        (status = 400, description = "Missing or invalid start url", body = crate::error::ApiError),
        (status = 504, description = "Crawl exceeded the task timeout", body = crate::error::ApiError)
    )
)]
pub async fn generate_crawl(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse> {
    generate(state, TaskType::Auto, body).await
}

/// POST /sitemap/local - Scan a directory and render the pages found
#[utoipa::path(
    post,
    path = "/sitemap/local",
    tag = "sitemap",
    request_body = crate::types::LocalParams,
    responses(
        (status = 200, description = "Sitemap document", content_type = "application/xml", body = String),
        (status = 400, description = "Missing dirPath or baseUrl", body = crate::error::ApiError),
        (status = 404, description = "Directory does not exist", body = crate::error::ApiError)
    )
)]
pub async fn generate_local(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse> {
    generate(state, TaskType::Local, body).await
}
