//! Retry backoff policy
//!
//! Two retryable classes are distinguished: rate-limited responses use a
//! larger base delay and budget (the remote is explicitly throttling),
//! transient network failures a smaller one. Both grow exponentially,
//! clamp each delay to a cap, and give up once the total elapsed retry
//! time exceeds the class budget. Fatal errors never reach this policy.

use std::time::Duration;

use crate::error::ErrorClass;

/// Exponential backoff configuration for retryable failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Base delay after the first rate-limited response
    pub rate_limit_base: Duration,
    /// Largest single delay for rate-limited responses
    pub rate_limit_cap: Duration,
    /// Total elapsed retry time allowed for rate-limited responses
    pub rate_limit_budget: Duration,
    /// Base delay after the first transient network failure
    pub transient_base: Duration,
    /// Largest single delay for transient network failures
    pub transient_cap: Duration,
    /// Total elapsed retry time allowed for transient network failures
    pub transient_budget: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            rate_limit_base: Duration::from_secs(5),
            rate_limit_cap: Duration::from_secs(120),
            rate_limit_budget: Duration::from_secs(600),
            transient_base: Duration::from_millis(500),
            transient_cap: Duration::from_secs(15),
            transient_budget: Duration::from_secs(120),
        }
    }
}

impl BackoffPolicy {
    /// Compute the delay before the next retry
    ///
    /// # Arguments
    /// * `class` - Classification of the failure being retried
    /// * `attempt` - Zero-based count of retries already performed
    /// * `elapsed` - Time since the first failure of the current run
    ///
    /// Returns `None` when the caller must give up: either the class is
    /// not retryable or the elapsed retry time exceeds the class budget.
    #[must_use]
    pub fn next_delay(
        &self,
        class: ErrorClass,
        attempt: u32,
        elapsed: Duration,
    ) -> Option<Duration> {
        let (base, cap, budget) = match class {
            ErrorClass::RateLimited => {
                (self.rate_limit_base, self.rate_limit_cap, self.rate_limit_budget)
            }
            ErrorClass::TransientNetwork => {
                (self.transient_base, self.transient_cap, self.transient_budget)
            }
            ErrorClass::Fatal => return None,
        };

        if elapsed > budget {
            return None;
        }

        let delay = 2u32
            .checked_pow(attempt)
            .and_then(|factor| base.checked_mul(factor))
            .map_or(cap, |d| d.min(cap));
        Some(delay)
    }
}
