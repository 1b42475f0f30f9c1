//! Retry policy
//!
//! Decides whether an attempt is retried and how long to wait before the
//! next one. The retry predicate is a trait object so tests and callers can
//! swap it without touching the attempt loop.

use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single attempt, as seen by the retry predicate
#[derive(Debug, Clone, Copy)]
pub enum Attempt<'a> {
    /// A response was received
    Response(StatusCode),
    /// The transport failed before a response arrived
    Failed(&'a reqwest::Error),
}

/// Predicate deciding whether an attempt is eligible for retry
pub trait RetryCheck: Send + Sync {
    /// Return true to retry the attempt
    fn should_retry(&self, attempt: Attempt<'_>) -> bool;
}

impl<F> RetryCheck for F
where
    F: Fn(Attempt<'_>) -> bool + Send + Sync,
{
    fn should_retry(&self, attempt: Attempt<'_>) -> bool {
        self(attempt)
    }
}

/// Retry transport failures, 429 and every 5xx
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryCheck;

impl RetryCheck for DefaultRetryCheck {
    fn should_retry(&self, attempt: Attempt<'_>) -> bool {
        match attempt {
            Attempt::Failed(_) => true,
            Attempt::Response(status) => is_retryable_status(status),
        }
    }
}

/// Never retry
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl RetryCheck for NeverRetry {
    fn should_retry(&self, _attempt: Attempt<'_>) -> bool {
        false
    }
}

/// Check if an HTTP status is retryable
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Retry bounds and predicate used by the transport
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    wait_min: Duration,
    wait_max: Duration,
    check: Arc<dyn RetryCheck>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Create a policy with the default predicate
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn new(max_retries: u32, wait_min: Duration, wait_max: Duration) -> Self {
        let mut policy = Self {
            max_retries,
            wait_min: Duration::ZERO,
            wait_max: Duration::ZERO,
            check: Arc::new(DefaultRetryCheck),
        };
        policy.set_wait(wait_min, wait_max);
        policy
    }

    /// Policy that performs a single attempt
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Set backoff bounds, normalized so that min <= max
    pub fn set_wait(&mut self, a: Duration, b: Duration) {
        self.wait_min = a.min(b);
        self.wait_max = a.max(b);
    }

    /// Set maximum number of retries after the first attempt
    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.max_retries = max_retries;
    }

    /// Replace the retry predicate
    pub fn set_check(&mut self, check: Arc<dyn RetryCheck>) {
        self.check = check;
    }

    /// Maximum number of retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Lower backoff bound
    pub fn wait_min(&self) -> Duration {
        self.wait_min
    }

    /// Upper backoff bound
    pub fn wait_max(&self) -> Duration {
        self.wait_max
    }

    /// Whether `attempt` (0-based) may be followed by another one
    pub fn should_retry(&self, attempt_index: u32, outcome: Attempt<'_>) -> bool {
        attempt_index < self.max_retries && self.check.should_retry(outcome)
    }

    /// Linear backoff with jitter for the given 0-based attempt
    ///
    /// A random base in `[min, max]` is multiplied by the attempt number.
    /// With `max <= min` the jitter collapses to `min * (attempt + 1)`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let multiplier = attempt_index.saturating_add(1);
        if self.wait_max <= self.wait_min {
            return self.wait_min.saturating_mul(multiplier);
        }

        let min = self.wait_min.as_nanos() as u64;
        let max = self.wait_max.as_nanos() as u64;
        let base = Duration::from_nanos(fastrand::u64(min..=max));
        base.saturating_mul(multiplier)
    }

    /// Wait for a retried response that carried `Retry-After`
    pub fn retry_after(&self, requested: Duration) -> Duration {
        requested.min(self.wait_max)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("wait_min", &self.wait_min)
            .field("wait_max", &self.wait_max)
            .finish_non_exhaustive()
    }
}

/// Extract a `Retry-After` value given in seconds
pub fn extract_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
