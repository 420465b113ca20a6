//! Exponential backoff for GitHub API calls.
//!
//! Only transient errors are retried. Once the retries are used up the last
//! error is returned and the work item fails; the scheduler re-runs it on a
//! later tick.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::GitHubApiError;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 3 retries with 2s, 4s, 8s delays.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        backoff_multiplier: 2.0,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether transient errors are retried at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    RetryTransient,
    NoRetry,
}

/// Runs `operation` until it succeeds, fails permanently, or the retries
/// are used up.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, GitHubApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let max_attempts = match policy {
        RetryPolicy::NoRetry => 1,
        RetryPolicy::RetryTransient => config.max_retries + 1,
    };
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if !e.kind.is_retriable() || attempt >= max_attempts {
                    return Err(e);
                }
                let delay = config.delay_for_attempt(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying GitHub call");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
