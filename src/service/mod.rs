//! Task service facade split into focused submodules.
//!
//! The `SitemapService` struct and its methods are organized by domain:
//! - [`tasks`] - Submitting, inspecting, listing and deleting tasks
//! - [`generate`] - Synchronous generation without a stored task
//! - [`lifecycle`] - Startup recovery, health and shutdown coordination

mod generate;
mod lifecycle;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use crate::config::Config;
use crate::error::Result;
use crate::executor::TaskExecutor;
use crate::producers::ProducerSet;
use crate::store::TaskStore;
use crate::types::Event;

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct SitemapService {
    /// Task table and its snapshot file
    /// Public for integration tests to inspect stored records
    pub store: Arc<TaskStore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Producers keyed by task type
    pub(crate) producers: Arc<ProducerSet>,
    /// Spawns and tracks task runs
    pub(crate) executor: TaskExecutor,
    /// Whether new tasks are accepted (false once shutdown starts)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// When the service was created
    pub(crate) started_at: Instant,
}

impl SitemapService {
    /// Create a new SitemapService with the built-in producers
    ///
    /// This opens the task store (loading any snapshot), fails tasks left
    /// unfinished by a previous process, and sets up the event channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is unreadable or the crawler's HTTP
    /// client cannot be built.
    pub async fn new(config: Config) -> Result<Self> {
        let producers = ProducerSet::standard(&config)?;
        Self::with_producers(config, producers).await
    }

    /// Create a service over a custom producer registry
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is unreadable or recovery cannot
    /// persist its changes.
    pub async fn with_producers(config: Config, producers: ProducerSet) -> Result<Self> {
        let store = Arc::new(TaskStore::open(config.tasks_file()).await?);

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let producers = Arc::new(producers);
        let executor = TaskExecutor::new(
            store.clone(),
            producers.clone(),
            config.executor.clone(),
            event_tx.clone(),
        );

        let service = Self {
            store,
            event_tx,
            config: Arc::new(config),
            producers,
            executor,
            accepting_new: Arc::new(AtomicBool::new(true)),
            started_at: Instant::now(),
        };

        service.recover().await?;

        Ok(service)
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives every event independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration the service was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for SitemapService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapService")
            .field("tasks_file", &self.store.path())
            .field("producers", &self.producers)
            .finish()
    }
}
