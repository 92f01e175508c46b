//! The activity stream adapter
//!
//! Composes the polling cursor, the backoff policy, and a page fetcher
//! into a lazy stream of activities. Per stream instance the state
//! machine is:
//!
//! - **Waiting**: no page token held (live edge); sleep one poll
//!   interval, then fetch.
//! - **Draining**: a page token is held; fetch the next page immediately
//!   so a backlog is delivered without artificial delay.
//! - **Fetching**: issue one page request; success resets the failure
//!   counters, a retryable failure consults the backoff policy, anything
//!   else (or give-up) propagates through the stream.
//!
//! Every sleep and the fetch itself observe the cancellation token.

use std::time::{Duration, Instant};

use async_stream::try_stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::api::{PageFetcher, PageRequest};
use crate::error::{AgentError, Result};
use crate::types::{Activity, StreamConfig};

use super::{ActivityFilter, PollCursor, StreamMode};

/// Consecutive-failure bookkeeping for one stream or history fetch
struct RetryState {
    attempt: u32,
    first_failure: Option<Instant>,
}

impl RetryState {
    const fn new() -> Self {
        Self {
            attempt: 0,
            first_failure: None,
        }
    }

    fn reset(&mut self) {
        self.attempt = 0;
        self.first_failure = None;
    }

    /// Delay before retrying after `err`, or `None` to give up
    fn next_delay(&mut self, err: &AgentError, config: &StreamConfig) -> Option<Duration> {
        let class = err.class();
        if !class.is_retryable() {
            return None;
        }
        let started = *self.first_failure.get_or_insert_with(Instant::now);
        let attempt = self.attempt;
        self.attempt += 1;
        if self.attempt > config.max_consecutive_failures {
            return None;
        }
        config.backoff.next_delay(class, attempt, started.elapsed())
    }
}

/// Open a continuous activity stream for one session
///
/// The stream is infinite in [`StreamMode::Interactive`]; in
/// [`StreamMode::Automated`] it ends once a terminal activity is
/// observed, after yielding it (unless the filter suppresses it).
/// Unrecoverable errors cross the stream boundary as a final `Err`
/// item; cancellation ends the stream quietly.
///
/// Each yielded activity is unique by id within the stream's lifetime,
/// and no activity is yielded with a `create_time` strictly below a
/// previously yielded one.
pub fn open_stream<'a, F: PageFetcher>(
    fetcher: &'a F,
    session_id: &str,
    filter: ActivityFilter,
    mode: StreamMode,
    config: StreamConfig,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Activity>> + 'a {
    let session_id = session_id.to_string();
    try_stream! {
        let mut cursor = PollCursor::new();
        let mut retry = RetryState::new();

        'poll: loop {
            if cursor.page_token.is_none() {
                // Waiting: live edge, sleep one poll interval.
                tokio::select! {
                    () = cancel.cancelled() => break 'poll,
                    () = tokio::time::sleep(config.poll_interval) => {}
                }
            }

            let request = PageRequest {
                session_id: session_id.clone(),
                page_token: cursor.page_token.clone(),
                page_size: config.page_size,
                after: filter.since.clone(),
            };
            let outcome = tokio::select! {
                () = cancel.cancelled() => break 'poll,
                outcome = fetcher.fetch_page(request) => outcome,
            };

            match outcome {
                Ok(page) => {
                    retry.reset();
                    cursor.page_token = page.next_page_token;
                    log::trace!(
                        "session {session_id}: page with {} activities, draining={}",
                        page.activities.len(),
                        cursor.page_token.is_some()
                    );
                    for activity in page.activities {
                        if !cursor.observe(&activity) {
                            log::trace!(
                                "session {session_id}: stale activity {} dropped",
                                activity.id
                            );
                            continue;
                        }
                        let terminal = activity.is_terminal();
                        if filter.accepts(&activity) {
                            yield activity;
                        }
                        if terminal && mode == StreamMode::Automated {
                            log::debug!(
                                "session {session_id}: terminal activity observed, ending stream"
                            );
                            break 'poll;
                        }
                    }
                }
                Err(err) => match retry.next_delay(&err, &config) {
                    Some(delay) => {
                        log::warn!(
                            "session {session_id}: page fetch failed ({err}), retrying in {delay:?}"
                        );
                        tokio::select! {
                            () = cancel.cancelled() => break 'poll,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => {
                        log::warn!("session {session_id}: giving up after {err}");
                        Err(err)?;
                    }
                },
            }
        }
    }
}

/// Drain the full activity history of a session, without polling
///
/// Fetches pages back to back until the remote stops returning a next
/// page token. Applies the same dedup as the live stream and the same
/// retry policy for retryable failures.
///
/// # Errors
/// Returns the first unrecoverable error, or a retryable error once the
/// backoff policy gives up.
pub async fn fetch_history<F: PageFetcher>(
    fetcher: &F,
    session_id: &str,
    config: &StreamConfig,
) -> Result<Vec<Activity>> {
    let mut cursor = PollCursor::new();
    let mut retry = RetryState::new();
    let mut activities = Vec::new();

    loop {
        let request = PageRequest {
            session_id: session_id.to_string(),
            page_token: cursor.page_token.clone(),
            page_size: config.page_size,
            after: None,
        };
        match fetcher.fetch_page(request).await {
            Ok(page) => {
                retry.reset();
                cursor.page_token = page.next_page_token;
                for activity in page.activities {
                    if cursor.observe(&activity) {
                        activities.push(activity);
                    }
                }
                if cursor.page_token.is_none() {
                    log::debug!(
                        "session {session_id}: history drained, {} activities",
                        activities.len()
                    );
                    return Ok(activities);
                }
            }
            Err(err) => match retry.next_delay(&err, config) {
                Some(delay) => {
                    log::warn!(
                        "session {session_id}: history fetch failed ({err}), retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            },
        }
    }
}
