//! External collaborator traits
//!
//! The streaming core consumes a page fetcher; the session facade adds
//! the three session-level calls on top. Implementations perform the
//! actual network I/O (see the `http` module for the bundled one) and
//! map transport outcomes onto the [`crate::error::AgentError`] taxonomy,
//! which carries the retry classification.

use std::future::Future;

use serde::Deserialize;

use crate::error::Result;
use crate::types::{Activity, Session};

/// Parameters for one page request
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Session whose activities are being listed
    pub session_id: String,
    /// Cursor returned by the previous page, if any
    pub page_token: Option<String>,
    /// Requested page size
    pub page_size: u32,
    /// Optional server-side lower bound on `create_time`
    pub after: Option<String>,
}

/// One page of activities
///
/// Pages are ordered by non-decreasing `create_time`; a missing
/// `next_page_token` means the caller is at the live edge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    /// Activities in page order
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Cursor for the next page, absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The external collaborator that performs the paginated network call
pub trait PageFetcher: Send + Sync {
    /// Fetch one page of activities
    ///
    /// # Errors
    /// Returns an error classified per [`crate::error::ErrorClass`]; only
    /// rate-limited and transient network failures are retried by the
    /// stream adapter.
    fn fetch_page(&self, request: PageRequest) -> impl Future<Output = Result<ActivityPage>> + Send;
}

/// Session-level operations on top of page fetching
///
/// None of these pre-validate state client-side; the remote is the
/// source of truth and rejects operations that are invalid for the
/// session's current state.
pub trait SessionApi: PageFetcher {
    /// Fetch current session metadata
    ///
    /// # Errors
    /// Returns an error on any non-success response
    fn get_session(&self, session_id: &str) -> impl Future<Output = Result<Session>> + Send;

    /// Approve the pending plan
    ///
    /// # Errors
    /// Returns an error if the remote rejects the approval, e.g. when no
    /// plan is awaiting approval
    fn approve_plan(&self, session_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Send a message into the session
    ///
    /// # Errors
    /// Returns an error if the remote rejects the message
    fn send_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
