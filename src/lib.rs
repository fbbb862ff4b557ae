//! # sitemap-tasks
//!
//! XML sitemap generation with an asynchronous, retrying task engine.
//!
//! Sitemaps come from one of three sources:
//! - an explicit URL list (`manual`)
//! - a breadth-first crawl of a website (`auto`)
//! - a scan of a local directory of pages (`local`)
//!
//! Work can run synchronously or as a background task. Background tasks are
//! persisted to a JSON snapshot, retried with backoff, bounded by a
//! wall-clock timeout, and observable through status, log and events.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sitemap_tasks::{Config, SitemapService, TaskType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SitemapService::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = service.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let id = service
//!         .submit(
//!             TaskType::Manual,
//!             serde_json::json!({"urls": ["https://example.com/"]}),
//!         )
//!         .await?;
//!     println!("submitted {id}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task executor (attempt loop, watchdog)
pub mod executor;
/// Sitemap producers
pub mod producers;
/// Retry classification and backoff
pub mod retry;
/// Task service facade (decomposed into focused submodules)
pub mod service;
/// Persistent task store
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, Result, TaskError, ToHttpStatus};
pub use producers::{ProducerSet, TaskContext, WorkProducer};
pub use service::SitemapService;
pub use store::TaskStore;
pub use types::{
    Event, HealthInfo, SitemapOptions, SystemInfo, Task, TaskFilter, TaskId, TaskStatus,
    TaskStatusInfo, TaskType,
};

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use sitemap_tasks::{SitemapService, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = SitemapService::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(service).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: SitemapService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
