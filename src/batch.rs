//! Batch execution of automated sessions
//!
//! Runs many independent automated sessions under a bounded concurrency
//! limit, optionally staggering starts by a fixed delay. Under
//! [`FailurePolicy::FailFast`] the whole batch fails on the first error;
//! otherwise individual failures are collected without aborting
//! siblings. Cancellation propagates through every suspension point:
//! admission, the stagger sleep, and the per-session streams.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, pin_mut};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::SessionApi;
use crate::error::{AgentError, Result};
use crate::stream::{ActivityFilter, StreamMode, open_stream};
use crate::types::{SessionState, StreamConfig};

/// What to do when one session in a batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Cancel all siblings and fail the whole batch on the first error
    FailFast,
    /// Collect failures and let the remaining sessions finish
    #[default]
    CollectErrors,
}

/// Configuration for one batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum sessions driven concurrently
    pub concurrency: usize,
    /// Fixed delay between session starts
    pub stagger: Option<Duration>,
    /// Failure handling policy
    pub failure_policy: FailurePolicy,
    /// Stream configuration applied to every session
    pub stream: StreamConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            stagger: None,
            failure_policy: FailurePolicy::default(),
            stream: StreamConfig::default(),
        }
    }
}

/// Result of driving one session to its terminal activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Session that was driven
    pub session_id: String,
    /// Final remote state after the stream ended
    pub final_state: SessionState,
    /// Distinct activities yielded by the stream
    pub activities_seen: usize,
}

/// Aggregate result of a batch run
#[derive(Debug)]
pub struct BatchReport {
    /// Client-generated identifier of this run, for log correlation
    pub run_id: Uuid,
    /// Sessions that reached a terminal activity
    pub outcomes: Vec<BatchOutcome>,
    /// Failed sessions with their errors (empty under fail-fast, which
    /// returns the first error instead)
    pub failures: Vec<(String, AgentError)>,
}

/// Drive every listed session to completion under the batch limits
///
/// # Errors
/// Under [`FailurePolicy::FailFast`], returns the first session error
/// after cancelling the siblings. Under
/// [`FailurePolicy::CollectErrors`], only returns `Err` when the batch
/// machinery itself fails; per-session errors land in
/// [`BatchReport::failures`].
pub async fn run_sessions<A: SessionApi + 'static>(
    api: Arc<A>,
    session_ids: Vec<String>,
    config: BatchConfig,
    cancel: CancellationToken,
) -> Result<BatchReport> {
    let run_id = Uuid::new_v4();
    log::info!(
        "batch {run_id}: starting {} sessions, concurrency {}",
        session_ids.len(),
        config.concurrency
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, session_id) in session_ids.into_iter().enumerate() {
        if index > 0 {
            if let Some(stagger) = config.stagger {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(stagger) => {}
                }
            }
        }
        let api = Arc::clone(&api);
        let semaphore = Arc::clone(&semaphore);
        let stream_config = config.stream.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let result =
                drive_session(api, &session_id, stream_config, semaphore, cancel).await;
            (session_id, result)
        });
    }

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let (session_id, result) = match joined {
            Ok(pair) => pair,
            Err(join_err) => {
                log::warn!("batch {run_id}: worker task failed: {join_err}");
                continue;
            }
        };
        match result {
            Ok(outcome) => {
                log::debug!(
                    "batch {run_id}: session {session_id} finished in state {:?}",
                    outcome.final_state
                );
                outcomes.push(outcome);
            }
            Err(err) => {
                log::warn!("batch {run_id}: session {session_id} failed: {err}");
                if config.failure_policy == FailurePolicy::FailFast {
                    cancel.cancel();
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                } else {
                    failures.push((session_id, err));
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    log::info!(
        "batch {run_id}: done, {} succeeded, {} failed",
        outcomes.len(),
        failures.len()
    );
    Ok(BatchReport {
        run_id,
        outcomes,
        failures,
    })
}

/// Drain one automated stream to its terminal activity
async fn drive_session<A: SessionApi>(
    api: Arc<A>,
    session_id: &str,
    config: StreamConfig,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
) -> Result<BatchOutcome> {
    let _permit = tokio::select! {
        () = cancel.cancelled() => return Err(AgentError::Cancelled),
        permit = semaphore.acquire_owned() => {
            permit.map_err(|_| AgentError::Cancelled)?
        }
    };

    let stream = open_stream(
        api.as_ref(),
        session_id,
        ActivityFilter::default(),
        StreamMode::Automated,
        config,
        cancel.clone(),
    );
    pin_mut!(stream);

    let mut activities_seen = 0usize;
    while let Some(item) = stream.next().await {
        item?;
        activities_seen += 1;
    }
    if cancel.is_cancelled() {
        return Err(AgentError::Cancelled);
    }

    let session = api.get_session(session_id).await?;
    Ok(BatchOutcome {
        session_id: session_id.to_string(),
        final_state: session.state,
        activities_seen,
    })
}
