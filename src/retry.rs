//! Retry classification and backoff between task attempts
//!
//! The executor drives its own attempt loop (it logs and commits per attempt),
//! so this module supplies the two pieces that loop needs:
//! - [`IsRetryable`] decides whether a failed attempt is worth repeating
//! - [`Backoff`] yields the exponential, optionally jittered, delay schedule
//!
//! # Example
//!
//! ```no_run
//! use sitemap_tasks::config::RetryConfig;
//! use sitemap_tasks::retry::Backoff;
//!
//! # async fn example() {
//! let mut backoff = Backoff::new(&RetryConfig::default());
//! for _ in 0..3 {
//!     tokio::time::sleep(backoff.next_delay()).await;
//! }
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network errors, upstream hiccups, flaky filesystems) should return `true`.
/// Permanent failures (malformed input, unsupported task type) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Bad parameters will not improve on a second try
            Error::InvalidInput(_) => false,
            // No producer for this type
            Error::Unsupported(_) => false,
            // The watchdog already ended the task
            Error::Timeout => false,
            Error::ShuttingDown => false,
            Error::Config { .. } => false,
            // Lifecycle errors describe the task, not the attempt
            Error::Task(_) => false,
            // A producer failure is the normal retry case
            Error::Producer(_) => true,
            Error::Network(_) => true,
            // A scan directory may be mounted late
            Error::NotFound(_) => true,
            Error::Io(_) => true,
            Error::Serialization(_) => false,
            Error::ApiServerError(_) => false,
            Error::Other(_) => true,
        }
    }
}

/// Exponential delay schedule between attempts
///
/// Each call to [`Backoff::next_delay`] returns the current delay (jittered
/// when enabled) and advances the base delay by `backoff_multiplier`, capped
/// at `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Backoff {
    /// Start a new schedule from the configured initial delay
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            delay: config.initial_delay.min(config.max_delay),
            max_delay: config.max_delay,
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }

    /// Delay to wait before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        let current = if self.jitter {
            add_jitter(self.delay)
        } else {
            self.delay
        };

        // Saturates at the cap instead of overflowing Duration
        let next = Duration::try_from_secs_f64(self.delay.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_delay);
        self.delay = next.min(self.max_delay);

        current
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::try_from_secs_f64(jittered_secs).unwrap_or(Duration::MAX)
}
