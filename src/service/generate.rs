//! Synchronous generation without a stored task.

use std::sync::atomic::Ordering;

use super::SitemapService;
use crate::error::{Error, Result};
use crate::producers::TaskContext;
use crate::types::TaskType;

impl SitemapService {
    /// Run the producer for `task_type` once, inline, and return its XML
    ///
    /// Nothing is stored and there are no retries. The run is still bounded
    /// by the executor's task timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once shutdown has started
    /// - [`Error::Timeout`] when the producer outlives the task timeout
    /// - whatever the producer returns (e.g. [`Error::InvalidInput`])
    pub async fn generate_now(
        &self,
        task_type: TaskType,
        params: &serde_json::Value,
    ) -> Result<String> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let producer = self.producers.get(task_type)?;
        let ctx = TaskContext::detached();
        let timeout = self.config.executor.task_timeout;

        tracing::debug!(task_type = %task_type, producer = producer.label(), "Generating sitemap inline");
        match tokio::time::timeout(timeout, producer.produce(params, &ctx)).await {
            Ok(result) => result,
            Err(_) => {
                ctx.cancellation().cancel();
                tracing::warn!(task_type = %task_type, timeout_secs = timeout.as_secs(), "Inline generation timed out");
                Err(Error::Timeout)
            }
        }
    }
}
