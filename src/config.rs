//! Configuration types for sitemap-tasks

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Main configuration
///
/// Every section and field has a default, so an empty JSON object (`{}`) is a
/// valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task snapshot location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Attempt loop, watchdog and backoff
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Site crawler behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Local directory scanner behavior
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. The result is validated
    /// before it is returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from the environment
    ///
    /// `SITEMAP_CONFIG` names an optional JSON file to start from;
    /// `SITEMAP_BIND` and `SITEMAP_TASKS_FILE` override the API bind address
    /// and the snapshot file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("SITEMAP_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(bind) = lookup("SITEMAP_BIND") {
            config.server.api.bind_address = bind.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{bind}': {e}"),
                key: Some("SITEMAP_BIND".into()),
            })?;
        }
        if let Some(tasks_file) = lookup("SITEMAP_TASKS_FILE") {
            config.persistence.tasks_file = PathBuf::from(tasks_file);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.executor.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".into(),
                key: Some("executor.max_attempts".into()),
            });
        }
        if self.executor.task_timeout.is_zero() {
            return Err(Error::Config {
                message: "task_timeout must be greater than zero".into(),
                key: Some("executor.task_timeout".into()),
            });
        }
        let multiplier = self.executor.retry.backoff_multiplier;
        if !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&multiplier) {
            return Err(Error::Config {
                message: format!(
                    "backoff_multiplier must be between 1.0 and {MAX_BACKOFF_MULTIPLIER}"
                ),
                key: Some("executor.retry.backoff_multiplier".into()),
            });
        }
        if self.executor.retry.max_delay > MAX_RETRY_DELAY {
            return Err(Error::Config {
                message: format!(
                    "max_delay must be at most {} seconds",
                    MAX_RETRY_DELAY.as_secs()
                ),
                key: Some("executor.retry.max_delay".into()),
            });
        }
        if self.crawler.max_concurrency == 0 {
            return Err(Error::Config {
                message: "max_concurrency must be at least 1".into(),
                key: Some("crawler.max_concurrency".into()),
            });
        }
        if self.scanner.page_extension.trim_start_matches('.').is_empty() {
            return Err(Error::Config {
                message: "page_extension must not be empty".into(),
                key: Some("scanner.page_extension".into()),
            });
        }
        Ok(())
    }

    /// Task snapshot file
    pub fn tasks_file(&self) -> &PathBuf {
        &self.persistence.tasks_file
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Snapshot file holding every task record (default: "data/tasks.json")
    #[serde(default = "default_tasks_file")]
    pub tasks_file: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            tasks_file: default_tasks_file(),
        }
    }
}

/// Task executor configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Attempts per task before it is marked failed (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock deadline for a whole task, all attempts included (default: 600 seconds)
    #[serde(default = "default_task_timeout", with = "duration_serde")]
    pub task_timeout: Duration,

    /// Delay schedule between attempts
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            task_timeout: default_task_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Backoff configuration between task attempts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the second attempt (default: 1 second, 0 disables waiting)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Back-to-back attempts with no delay
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Site crawler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Depth used when an `auto` request omits `maxDepth` (default: 3)
    #[serde(default = "default_max_depth")]
    pub default_max_depth: u32,

    /// Per-page fetch timeout (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Pages fetched concurrently within one depth level (default: 5)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pause between fetch waves, in milliseconds (default: 250)
    #[serde(default = "default_request_interval", with = "millis_serde")]
    pub request_interval: Duration,

    /// Upper bound on discovered pages (None = unlimited)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            request_timeout: default_request_timeout(),
            max_concurrency: default_max_concurrency(),
            request_interval: default_request_interval(),
            max_pages: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Local directory scanner configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// File extension that marks a page (default: "html")
    #[serde(default = "default_page_extension")]
    pub page_extension: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            page_extension: default_page_extension(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Upper bound for `executor.retry.backoff_multiplier`
const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Upper bound for `executor.retry.max_delay`
const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

fn default_tasks_file() -> PathBuf {
    PathBuf::from("data/tasks.json")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_task_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_concurrency() -> usize {
    5
}

fn default_request_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_user_agent() -> String {
    format!("sitemap-tasks/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_extension() -> String {
    "html".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond variant for sub-second intervals
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
