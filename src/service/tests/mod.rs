use super::test_helpers::*;
use super::*;
use crate::error::{Error, TaskError};
use crate::producers::{ManualProducer, TaskContext, WorkProducer};
use crate::types::{TaskFilter, TaskStatus, TaskType};
use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;


/// Blocks until `release` is cancelled, then returns a fixed document
struct Gate {
    release: CancellationToken,
}

#[async_trait]
impl WorkProducer for Gate {
    async fn produce(&self, _params: &serde_json::Value, _ctx: &TaskContext) -> Result<String> {
        self.release.cancelled().await;
        Ok("<urlset/>".to_string())
    }

    fn label(&self) -> &'static str {
        "gate"
    }
}

/// Service whose `manual` tasks hold until the returned token is cancelled
async fn gated_service() -> (SitemapService, CancellationToken, tempfile::TempDir) {
    let release = CancellationToken::new();
    let producers = ProducerSet::new().with(
        TaskType::Manual,
        Arc::new(Gate {
            release: release.clone(),
        }),
    );
    let (service, dir) = create_test_service_with(producers, |_| {}).await;
    (service, release, dir)
}
