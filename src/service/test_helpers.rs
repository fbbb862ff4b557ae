//! Shared test helpers for creating SitemapService instances in tests.

use crate::config::{Config, RetryConfig};
use crate::producers::ProducerSet;
use crate::service::SitemapService;
use tempfile::tempdir;

/// Config whose snapshot lives in `dir`, with no backoff between attempts
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.tasks_file = dir.join("tasks.json");
    config.executor.retry = RetryConfig::immediate();
    config
}

/// Helper to create a test SitemapService with the built-in producers.
/// Returns the service and the tempdir (which must be kept alive).
pub(crate) async fn create_test_service() -> (SitemapService, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let service = SitemapService::new(test_config(temp_dir.path()))
        .await
        .unwrap();
    (service, temp_dir)
}

/// Helper to create a test SitemapService over custom producers.
pub(crate) async fn create_test_service_with(
    producers: ProducerSet,
    configure: impl FnOnce(&mut Config),
) -> (SitemapService, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    configure(&mut config);
    let service = SitemapService::with_producers(config, producers)
        .await
        .unwrap();
    (service, temp_dir)
}

/// Poll until the task reaches a terminal status (5 second cap)
pub(crate) async fn wait_terminal(
    service: &SitemapService,
    id: &crate::types::TaskId,
) -> crate::types::TaskStatusInfo {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let info = service.get_status(id).await.unwrap();
        if info.status.is_terminal() {
            return info;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {id} did not finish, status {}",
            info.status
        );
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
