//! Session facade
//!
//! Higher-level operations over one remote session, composed from the
//! activity stream adapter and a [`SessionApi`] collaborator. State is
//! never pre-validated client-side; the remote is the source of truth
//! and rejects operations that are invalid for the current state.

mod snapshot;

pub use snapshot::{SessionInsights, SessionSnapshot};

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use futures::{Stream, StreamExt, pin_mut};
use tokio_util::sync::CancellationToken;

use crate::api::SessionApi;
use crate::cache::SessionCache;
use crate::error::{AgentError, Result};
use crate::stream::{ActivityFilter, StreamMode, fetch_history, open_stream};
use crate::types::{Activity, Originator, Session, StreamConfig};

/// Handle to one remote agent session
pub struct SessionHandle<A: SessionApi> {
    api: Arc<A>,
    session_id: String,
    config: StreamConfig,
}

impl<A: SessionApi> SessionHandle<A> {
    /// Create a handle with the default stream configuration
    pub fn new(api: Arc<A>, session_id: impl Into<String>) -> Self {
        Self::with_config(api, session_id, StreamConfig::default())
    }

    /// Create a handle with an explicit stream configuration
    pub fn with_config(api: Arc<A>, session_id: impl Into<String>, config: StreamConfig) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            config,
        }
    }

    /// Identifier of the session this handle drives
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Fetch current session metadata
    ///
    /// # Errors
    /// Returns an error on any non-success response
    pub async fn get(&self) -> Result<Session> {
        self.api.get_session(&self.session_id).await
    }

    /// Approve the pending plan
    ///
    /// # Errors
    /// Returns an error if the remote rejects the approval
    pub async fn approve_plan(&self) -> Result<()> {
        log::info!("session {}: approving pending plan", self.session_id);
        self.api.approve_plan(&self.session_id).await
    }

    /// Send a message into the session
    ///
    /// # Errors
    /// Returns an error if the remote rejects the message
    pub async fn send_message(&self, message: &str) -> Result<()> {
        self.api.send_message(&self.session_id, message).await
    }

    /// Open a live activity stream for this session
    pub fn activities(
        &self,
        filter: ActivityFilter,
        mode: StreamMode,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Activity>> + '_ {
        open_stream(
            self.api.as_ref(),
            &self.session_id,
            filter,
            mode,
            self.config.clone(),
            cancel,
        )
    }

    /// Drain the full activity history, without polling
    ///
    /// # Errors
    /// Propagates unrecoverable fetch errors
    pub async fn history(&self) -> Result<Vec<Activity>> {
        fetch_history(self.api.as_ref(), &self.session_id, &self.config).await
    }

    /// Send a message and wait for the first reply
    ///
    /// Scans an automated stream, excluding the caller's own originator,
    /// for the first message activity created after the send time.
    ///
    /// # Errors
    /// Returns [`AgentError::StreamEndedWithoutReply`] if the stream ends
    /// before a matching reply appears, or propagates stream errors.
    pub async fn ask(&self, message: &str) -> Result<Activity> {
        let sent_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.send_message(message).await?;

        let filter = ActivityFilter {
            exclude_originator: Some(Originator::User),
            since: None,
        };
        let cancel = CancellationToken::new();
        let stream = self.activities(filter, StreamMode::Automated, cancel);
        pin_mut!(stream);

        while let Some(item) = stream.next().await {
            let activity = item?;
            if activity.create_time.as_str() > sent_at.as_str() && activity.message().is_some() {
                return Ok(activity);
            }
        }
        Err(AgentError::StreamEndedWithoutReply)
    }

    /// Poll session metadata until a terminal state is observed
    ///
    /// # Errors
    /// Propagates metadata fetch errors
    pub async fn wait_until_terminal(&self, poll_interval: Duration) -> Result<Session> {
        loop {
            let session = self.get().await?;
            if session.state.is_terminal() {
                log::info!(
                    "session {}: reached terminal state {:?}",
                    self.session_id,
                    session.state
                );
                return Ok(session);
            }
            log::debug!(
                "session {}: state {:?}, polling again in {:?}",
                self.session_id,
                session.state,
                poll_interval
            );
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Fetch metadata and full history concurrently and derive a snapshot
    ///
    /// # Errors
    /// Propagates the first fetch error
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (session, history) = tokio::join!(
            self.api.get_session(&self.session_id),
            fetch_history(self.api.as_ref(), &self.session_id, &self.config),
        );
        Ok(SessionSnapshot::build(session?, history?))
    }

    /// Write current metadata and history through to a cache
    ///
    /// Returns the number of activities recorded.
    ///
    /// # Errors
    /// Propagates fetch and cache errors
    pub async fn sync_to_cache<C: SessionCache>(&self, cache: &C) -> Result<usize> {
        let (session, history) = tokio::join!(
            self.api.get_session(&self.session_id),
            fetch_history(self.api.as_ref(), &self.session_id, &self.config),
        );
        let history = history?;
        let count = history.len();
        cache.put_session(session?).await?;
        cache.put_activities(&self.session_id, history).await?;
        Ok(count)
    }
}
