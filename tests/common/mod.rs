//! Shared helpers for integration tests

#![allow(dead_code)]

use sitemap_tasks::config::RetryConfig;
use sitemap_tasks::{Config, SitemapService, TaskId, TaskStatusInfo};
use std::path::Path;
use std::time::Duration;

/// Config with its snapshot in `dir` and no backoff between attempts
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.persistence.tasks_file = dir.join("tasks.json");
    config.executor.retry = RetryConfig::immediate();
    config.crawler.request_interval = Duration::from_millis(0);
    config
}

/// Poll the service until the task is terminal
pub async fn wait_terminal(service: &SitemapService, id: &TaskId) -> TaskStatusInfo {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let info = service.get_status(id).await.unwrap();
            if info.status.is_terminal() {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("task should reach a terminal status")
}

/// Log lines with their timestamp prefix removed
pub fn messages(log: &[String]) -> Vec<String> {
    log.iter()
        .map(|line| {
            line.split_once("] ")
                .map(|(_, m)| m.to_string())
                .unwrap_or_else(|| line.clone())
        })
        .collect()
}
