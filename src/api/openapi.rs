//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the sitemap-tasks REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the sitemap-tasks REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "sitemap-tasks REST API",
        description = "Background and synchronous XML sitemap generation from URL lists, site crawls and local directories",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Background tasks
        crate::api::routes::submit_task,
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,
        crate::api::routes::get_task_result,
        crate::api::routes::get_task_log,
        crate::api::routes::delete_task,

        // Synchronous generation
        crate::api::routes::generate_manual,
        crate::api::routes::generate_crawl,
        crate::api::routes::generate_local,

        // System
        crate::api::routes::health_check,
        crate::api::routes::system_info,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskType,
        crate::types::TaskStatus,
        crate::types::Task,
        crate::types::TaskStatusInfo,
        crate::types::TaskSummary,
        crate::types::TaskList,
        crate::types::TaskLog,
        crate::types::TaskCounts,
        crate::types::HealthInfo,
        crate::types::SystemInfo,
        crate::types::SitemapOptions,
        crate::types::ManualParams,
        crate::types::AutoParams,
        crate::types::LocalParams,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::SubmitTaskRequest,
        crate::api::routes::SubmitTaskResponse,
        crate::api::routes::ListTasksQuery,
        crate::api::routes::DeleteTaskResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Background tasks - Submit, poll, fetch results and logs, delete"),
        (name = "sitemap", description = "Synchronous generation - Render a sitemap in the request"),
        (name = "system", description = "System endpoints - Health, system info, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
