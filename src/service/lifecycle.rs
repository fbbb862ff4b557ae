//! Startup recovery, health and shutdown coordination.

use std::sync::atomic::Ordering;

use chrono::{SecondsFormat, Utc};

use super::SitemapService;
use crate::error::Result;
use crate::types::{Event, HealthInfo, SystemInfo};

/// Error and log text for tasks a previous process left unfinished
const RESTART_REASON: &str = "interrupted by restart";

impl SitemapService {
    /// Fail tasks a previous process left pending or processing
    ///
    /// No executor owns those records anymore and a task runs at most once,
    /// so they are closed instead of resumed.
    pub(crate) async fn recover(&self) -> Result<()> {
        let failed = self.store.fail_unfinished(RESTART_REASON).await?;
        if !failed.is_empty() {
            tracing::warn!(count = failed.len(), "Failed tasks interrupted by restart");
        }
        for id in failed {
            self.emit(Event::Failed {
                id,
                error: RESTART_REASON.to_string(),
            });
        }
        Ok(())
    }

    /// Gracefully shut down the service
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new tasks
    /// 2. Cancels every running producer (their tasks fail with
    ///    "interrupted by shutdown")
    /// 3. Waits for the runs to commit, with a timeout (30 seconds)
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Every committed change is already in the snapshot file, so there is
    /// no final flush.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new tasks
        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        // 2. Cancel running producers
        self.executor.cancel_all();
        tracing::info!(
            active_count = self.executor.active_count().await,
            "Signaled cancellation to all running tasks"
        );

        // 3. Wait for runs to commit with timeout
        let shutdown_timeout = std::time::Duration::from_secs(30);
        match tokio::time::timeout(shutdown_timeout, self.executor.wait_idle()).await {
            Ok(()) => tracing::info!("All running tasks finished"),
            Err(_) => {
                tracing::warn!("Timeout waiting for tasks to finish, proceeding with shutdown")
            }
        }

        // 4. Emit shutdown event
        self.emit(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new tasks are accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Liveness report with task totals
    pub async fn health(&self) -> HealthInfo {
        HealthInfo {
            status: "ok".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            tasks: self.store.counts().await,
            shutting_down: !self.is_accepting(),
        }
    }

    /// Host and process information
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}
