//! REST API server module
//!
//! Exposes task submission and inspection, synchronous sitemap generation,
//! health and an SSE event stream, documented with OpenAPI.

use crate::{Config, Result, SitemapService};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Where the Swagger UI fetches its OpenAPI document from
const SWAGGER_SPEC_PATH: &str = "/api-docs/openapi.json";

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Background Tasks
/// - `POST /tasks` - Submit a task (`{type, params}`), answers 202 with its id
/// - `GET /tasks` - List tasks (`?status=&type=`), newest first
/// - `GET /tasks/:id` - Task status
/// - `GET /tasks/:id/result` - Sitemap XML of a successful task
/// - `GET /tasks/:id/log` - Task progress log
/// - `DELETE /tasks/:id` - Remove a finished task
///
/// ## Synchronous Generation
/// - `POST /sitemap` - Render an explicit URL list
/// - `POST /sitemap/crawl` - Crawl a site
/// - `POST /sitemap/local` - Scan a local directory
///
/// ## System
/// - `GET /health` - Health check with task totals
/// - `GET /system` - Host and process information
/// - `GET /events` - Server-sent events stream
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled),
///   backed by `GET /api-docs/openapi.json`
pub fn create_router(service: Arc<SitemapService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    let router = Router::new()
        // Background tasks
        .route("/tasks", post(routes::submit_task).get(routes::list_tasks))
        .route("/tasks/:id", get(routes::get_task).delete(routes::delete_task))
        .route("/tasks/:id/result", get(routes::get_task_result))
        .route("/tasks/:id/log", get(routes::get_task_log))
        // Synchronous generation
        .route("/sitemap", post(routes::generate_manual))
        .route("/sitemap/crawl", post(routes::generate_crawl))
        .route("/sitemap/local", post(routes::generate_local))
        // System
        .route("/health", get(routes::health_check))
        .route("/system", get(routes::system_info))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI serves its own copy of the document; /openapi.json is taken
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_SPEC_PATH, ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. Methods and headers are unrestricted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Serves until `shutdown` resolves, then stops accepting connections and
/// lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use sitemap_tasks::{Config, SitemapService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let service = Arc::new(SitemapService::new((*config).clone()).await?);
///
/// sitemap_tasks::api::start_api_server(service, config, async {
///     tokio::signal::ctrl_c().await.ok();
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    service: Arc<SitemapService>,
    config: Arc<Config>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
