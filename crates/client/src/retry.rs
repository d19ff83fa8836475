//! Retry helper with configurable backoff.
//!
//! The default policy retries every failure up to three more times, waiting
//! `delay × attempt` between tries (1 s, 2 s, 3 s).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::Error;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay between attempts.
    pub delay: Duration,
    /// Upper bound on any single wait. Unbounded by default.
    pub max_delay: Duration,
    /// Backoff strategy to use.
    pub backoff: BackoffStrategy,
    /// Which failures are retried.
    pub retry_on: RetryOn,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
            max_delay: Duration::MAX,
            backoff: BackoffStrategy::Linear,
            retry_on: RetryOn::AnyError,
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set which failures are retried.
    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Disable retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Backoff strategy for determining retry delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Constant delay between retries.
    Constant,
    /// Linear increase in delay (delay * attempt).
    Linear,
    /// Exponential increase in delay (delay * factor^(attempt - 1)).
    Exponential { factor: f64 },
    /// Exponential with random jitter to avoid thundering herd.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// Calculate the delay before retry number `attempt` (1-indexed).
    pub fn delay(&self, attempt: u32, base: Duration, max_delay: Duration) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self {
            BackoffStrategy::Constant => base,
            BackoffStrategy::Linear => base.saturating_mul(attempt),
            BackoffStrategy::Exponential { factor } => {
                let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                secs_to_duration(base.as_secs_f64() * factor.powi(exponent), max_delay)
            }
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let base_delay = base.as_secs_f64() * factor.powi(exponent);

                // Jitter: uniform in [0, base_delay)
                let jitter = rand::rng().random::<f64>() * base_delay;

                secs_to_duration(base_delay + jitter, max_delay)
            }
        };

        std::cmp::min(delay, max_delay)
    }
}

/// Float seconds to a `Duration`: NaN and non-positive values are zero,
/// values beyond `Duration`'s range saturate at `max_delay`.
fn secs_to_duration(secs: f64, max_delay: Duration) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).map_or(max_delay, |d| d.min(max_delay))
}

/// Which failures a retry policy retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryOn {
    /// Every failure, including business and validation errors.
    #[default]
    AnyError,
    /// Only failures classified as retryable (transport errors, 429, 5xx).
    Retryable,
}

impl RetryOn {
    /// Returns true if `err` should be retried under this condition.
    pub fn allows(&self, err: &Error) -> bool {
        match self {
            RetryOn::AnyError => true,
            RetryOn::Retryable => err.is_retryable(),
        }
    }
}

/// Retry policy that tracks attempts for a single operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    /// Create a new retry policy from config.
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Number of retries handed out so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns true if another retry is allowed.
    pub fn should_retry(&self) -> bool {
        self.attempt < self.config.max_retries
    }

    /// Record a retry and return the delay before it.
    /// Returns None if retries are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }

        self.attempt += 1;
        Some(
            self.config
                .backoff
                .delay(self.attempt, self.config.delay, self.config.max_delay),
        )
    }
}

/// Run `op`, retrying every failure according to `config`.
///
/// After `config.max_retries` retries the last error is returned.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_when(config, op, |_| true).await
}

/// Run `op`, retrying failures for which `should_retry` returns true.
pub async fn retry_when<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut op: F,
    should_retry: P,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut policy = RetryPolicy::new(config.clone());

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if should_retry(&err) => match policy.next_delay() {
                Some(delay) => {
                    warn!(
                        attempt = policy.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        }
    }
}
