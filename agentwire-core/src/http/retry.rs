//! Retry policy with exponential backoff and jitter
//!
//! Applied to buffered requests only. `max_attempts` counts every attempt,
//! including the first.

use super::error::{ClientError, ClientResult};
use crate::config::TransportConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts (at least one)
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Base for exponential backoff (e.g., 2.0 for doubling)
    pub exponential_base: f64,

    /// Jitter factor (0.0 to 1.0) to randomize delays
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential_base: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy driven by transport settings
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: config.retry_backoff_base,
            ..Default::default()
        }
    }

    /// Create a policy with a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0 for the first retry)
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let base_nanos = self.base_delay.as_nanos() as f64;
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_nanos = (base_nanos * self.exponential_base.powi(exponent))
            .min(self.max_delay.as_nanos() as f64);

        let delay_with_jitter = if self.jitter_factor > 0.0 && delay_nanos > 0.0 {
            let jitter_range = delay_nanos * self.jitter_factor;
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (delay_nanos + jitter).max(0.0)
        } else {
            delay_nanos
        };

        Duration::from_nanos(delay_with_jitter as u64)
    }

    /// Whether another attempt follows a failed attempt number `attempt` (1-based)
    pub fn should_retry(&self, error: &ClientError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}

/// Executor for retry operations
#[derive(Debug)]
pub struct RetryExecutor<'a> {
    policy: &'a RetryPolicy,
}

impl<'a> RetryExecutor<'a> {
    /// Create a new retry executor with the given policy
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `operation` until it succeeds, fails terminally, runs out of
    /// attempts, or `cancel` fires. The operation receives the 1-based
    /// attempt number.
    pub async fn execute<F, T, Fut>(&self, cancel: &CancellationToken, mut operation: F) -> ClientResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = operation(attempt) => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !self.policy.should_retry(&error, attempt) {
                return Err(error);
            }

            let delay = self.policy.calculate_delay(attempt - 1);
            warn!(
                "Attempt {}/{} failed: {}; retrying in {:?}",
                attempt, self.policy.max_attempts, error, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
