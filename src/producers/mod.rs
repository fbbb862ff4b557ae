//! Work producers: the sitemap generation strategies tasks run
//!
//! - [`ManualProducer`] renders an explicit URL list (`manual`)
//! - [`CrawlProducer`] crawls a site from a start URL (`auto`)
//! - [`LocalProducer`] scans a local directory for pages (`local`)
//!
//! The executor looks producers up by [`TaskType`] through a [`ProducerSet`].

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::TaskType;

mod crawl;
mod crawler;
mod local;
mod manual;
mod sitemap;
mod traits;

pub use crawl::CrawlProducer;
pub use crawler::SiteCrawler;
pub use local::LocalProducer;
pub use manual::{ManualProducer, generate_from_urls};
pub use sitemap::{escape_xml, generate_sitemap};
pub use traits::{TaskContext, WorkProducer};

/// Registry of producers keyed by task type
#[derive(Clone, Default)]
pub struct ProducerSet {
    producers: HashMap<TaskType, Arc<dyn WorkProducer>>,
}

impl ProducerSet {
    /// Empty registry; every task type is unsupported until registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in producers
    ///
    /// # Errors
    /// Returns error if the crawler's HTTP client cannot be created
    pub fn standard(config: &Config) -> Result<Self> {
        Ok(Self::new()
            .with(TaskType::Manual, Arc::new(ManualProducer))
            .with(
                TaskType::Auto,
                Arc::new(CrawlProducer::new(config.crawler.clone())?),
            )
            .with(TaskType::Local, Arc::new(LocalProducer::new(&config.scanner))))
    }

    /// Register (or replace) the producer for a task type
    pub fn with(mut self, task_type: TaskType, producer: Arc<dyn WorkProducer>) -> Self {
        self.producers.insert(task_type, producer);
        self
    }

    /// Producer for a task type
    ///
    /// # Errors
    /// [`Error::Unsupported`] when nothing is registered for `task_type`.
    pub fn get(&self, task_type: TaskType) -> Result<Arc<dyn WorkProducer>> {
        self.producers
            .get(&task_type)
            .cloned()
            .ok_or_else(|| Error::Unsupported(task_type.to_string()))
    }
}

impl std::fmt::Debug for ProducerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.producers.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("ProducerSet").field("types", &types).finish()
    }
}

/// Decode a task's params into the producer's typed payload
pub(crate) fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T> {
    T::deserialize(params).map_err(|e| Error::InvalidInput(format!("invalid params: {e}")))
}
