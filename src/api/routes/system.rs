//! System handlers: health, system info, OpenAPI, events.

use crate::api::AppState;
use crate::types::{Event, HealthInfo, SystemInfo};
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthInfo)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthInfo> {
    Json(state.service.health().await)
}

/// GET /system - Host and process information
#[utoipa::path(
    get,
    path = "/system",
    tag = "system",
    responses(
        (status = 200, description = "System information", body = SystemInfo)
    )
)]
pub async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(state.service.system_info())
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.service.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default()
                .event(event_name(&event))
                .data(json_data))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize event to JSON");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Submitted { .. } => "submitted",
        Event::Started { .. } => "started",
        Event::AttemptStarted { .. } => "attempt_started",
        Event::AttemptFailed { .. } => "attempt_failed",
        Event::Progress { .. } => "progress",
        Event::Completed { .. } => "completed",
        Event::Failed { .. } => "failed",
        Event::TimedOut { .. } => "timed_out",
        Event::Deleted { .. } => "deleted",
        Event::Shutdown => "shutdown",
    }
}
