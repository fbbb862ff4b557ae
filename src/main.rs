//! sitemap-server – entry point.
//!
//! Startup order:
//! 1. Load configuration (`SITEMAP_CONFIG` file plus environment overrides).
//! 2. Initialise structured tracing (`SITEMAP_LOG`, `SITEMAP_LOG_JSON`).
//! 3. Open the task store and fail tasks left over from a previous run.
//! 4. Serve the REST API until SIGINT/SIGTERM, then shut the service down.

use std::sync::Arc;

use sitemap_tasks::{Config, SitemapService, api, run_with_shutdown};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration
    let config = Config::from_env()?;

    // 2. Tracing
    init_tracing();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tasks_file = %config.tasks_file().display(),
        "sitemap-server starting"
    );

    // 3. Service
    let service = Arc::new(SitemapService::new(config.clone()).await?);

    // 4. HTTP server with graceful shutdown
    let stop_serving = CancellationToken::new();
    let mut server = tokio::spawn(api::start_api_server(
        service.clone(),
        Arc::new(config),
        stop_serving.clone().cancelled_owned(),
    ));

    tokio::select! {
        joined = &mut server => {
            // The server only returns early when it cannot bind or serve
            joined??;
            return Ok(());
        }
        shutdown = run_with_shutdown(service.as_ref().clone()) => shutdown?,
    }

    stop_serving.cancel();
    server.await??;

    tracing::info!("sitemap-server stopped");
    Ok(())
}

fn init_tracing() {
    let log_level = std::env::var("SITEMAP_LOG").unwrap_or_else(|_| "info".to_owned());
    let log_json = std::env::var("SITEMAP_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let env_filter = match log_level.parse::<tracing_subscriber::EnvFilter>() {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "WARN: SITEMAP_LOG='{}' is not a valid tracing filter ({}); falling back to 'info'",
                log_level, e
            );
            tracing_subscriber::EnvFilter::new("info")
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
