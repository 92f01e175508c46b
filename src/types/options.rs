//! Stream configuration
//!
//! All knobs are supplied by the caller at construction; nothing is read
//! from the environment or from process-wide defaults.

use std::time::Duration;

use crate::backoff::BackoffPolicy;

/// Configuration for activity streams and history fetches
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sleep between polls when the stream is at the live edge
    pub poll_interval: Duration,
    /// Page size requested from the remote
    pub page_size: u32,
    /// Consecutive retryable failures tolerated before giving up,
    /// independent of the backoff time budgets
    pub max_consecutive_failures: u32,
    /// Retry delays for rate-limited and transient failures
    pub backoff: BackoffPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            page_size: 50,
            max_consecutive_failures: 5,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl StreamConfig {
    /// Set the inter-poll sleep
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the requested page size
    #[must_use]
    pub const fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the consecutive-failure limit
    #[must_use]
    pub const fn max_consecutive_failures(mut self, limit: u32) -> Self {
        self.max_consecutive_failures = limit;
        self
    }

    /// Set the backoff policy
    #[must_use]
    pub const fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = policy;
        self
    }
}
