//! Error types for the agent sessions client

use std::time::Duration;

use thiserror::Error;

/// Main error type for the agent sessions client
#[derive(Error, Debug)]
pub enum AgentError {
    /// Transport-level failure or timeout; retryable under backoff
    #[error("Network error: {0}")]
    Network(String),

    /// Explicit throttling signal from the remote; retryable under a
    /// longer backoff with its own total-time budget
    #[error("Rate limited by remote: {0}")]
    RateLimited(String),

    /// Credential rejected; never retried
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Any other non-success response; never retried by the core
    #[error("API error (status {status}) at {endpoint}: {message}")]
    Api {
        /// HTTP status code returned by the remote
        status: u16,
        /// Endpoint the request was issued against
        endpoint: String,
        /// Error message or response body excerpt
        message: String,
    },

    /// JSON decode error when mapping a response body
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// The stream terminated before a matching reply appeared
    #[error("Stream ended without a reply")]
    StreamEndedWithoutReply,

    /// The operation was cancelled before completion; never retried
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for agent session operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Classification of a transport outcome, used to pick a retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Remote signalled explicit throttling
    RateLimited,
    /// Transport-level failure that is expected to clear on its own
    TransientNetwork,
    /// Not retryable; surfaced immediately on first occurrence
    Fatal,
}

impl ErrorClass {
    /// Whether this class is subject to the backoff policy
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::TransientNetwork)
    }
}

impl AgentError {
    /// Classify this error for retry purposes
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited(_) => ErrorClass::RateLimited,
            Self::Network(_) => ErrorClass::TransientNetwork,
            _ => ErrorClass::Fatal,
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a rate-limited error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a rate-limited error from an optional `Retry-After` hint
    #[must_use]
    pub fn rate_limited_after(retry_after: Option<Duration>) -> Self {
        match retry_after {
            Some(after) => Self::RateLimited(format!("retry after {}s", after.as_secs())),
            None => Self::RateLimited("no retry hint provided".to_string()),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an API error with status and endpoint context
    pub fn api(status: u16, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert_eq!(
            AgentError::network("connection reset").class(),
            ErrorClass::TransientNetwork
        );
        assert_eq!(
            AgentError::rate_limited("429").class(),
            ErrorClass::RateLimited
        );
        assert!(ErrorClass::TransientNetwork.is_retryable());
        assert!(ErrorClass::RateLimited.is_retryable());
    }

    #[test]
    fn fatal_classes() {
        assert_eq!(AgentError::auth("bad key").class(), ErrorClass::Fatal);
        assert_eq!(
            AgentError::api(500, "/sessions/s1", "boom").class(),
            ErrorClass::Fatal
        );
        assert_eq!(
            AgentError::StreamEndedWithoutReply.class(),
            ErrorClass::Fatal
        );
        assert_eq!(AgentError::Cancelled.class(), ErrorClass::Fatal);
        assert!(!ErrorClass::Fatal.is_retryable());
    }
}
