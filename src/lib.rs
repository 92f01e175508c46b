//! # Agent Sessions Client
//!
//! Client library for driving long-running, asynchronous remote agent
//! sessions exposed by a cursor-paginated, poll-only HTTP resource API,
//! and for interpreting the unified-diff output those sessions produce.
//!
//! The two load-bearing pieces are:
//!
//! - [`stream::open_stream`] — adapts the paginated list endpoint into a
//!   continuous, deduplicated, time-ordered stream of [`Activity`]
//!   values, with exponential backoff on retryable failures and
//!   cooperative cancellation at every suspension point.
//! - [`diff::parse`] / [`diff::parse_with_content`] — turn a raw
//!   unified-diff patch into per-file change records with line
//!   statistics. Parsing is pure and infallible; malformed sections are
//!   skipped and counted.
//!
//! Everything network-shaped sits behind the narrow [`api::PageFetcher`]
//! and [`api::SessionApi`] traits; the `http` feature ships a
//! `reqwest`-based implementation.
//!
//! ## Streaming a session
//!
//! ```ignore
//! use agent_sessions::http::{HttpConfig, HttpSessionApi};
//! use agent_sessions::stream::{ActivityFilter, StreamMode};
//! use agent_sessions::SessionHandle;
//! use futures::{StreamExt, pin_mut};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> agent_sessions::Result<()> {
//! let api = Arc::new(HttpSessionApi::new(HttpConfig::new(
//!     "https://api.example.com/v1",
//!     std::env::var("API_KEY").unwrap_or_default(),
//! ))?);
//! let handle = SessionHandle::new(api, "sessions/abc123");
//!
//! let cancel = CancellationToken::new();
//! let stream = handle.activities(
//!     ActivityFilter::default(),
//!     StreamMode::Automated,
//!     cancel,
//! );
//! pin_mut!(stream);
//! while let Some(activity) = stream.next().await {
//!     log::info!("{:?}", activity?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Parsing a change set
//!
//! ```
//! let patch = "diff --git a/src/main.rs b/src/main.rs\n\
//!              --- /dev/null\n\
//!              +++ b/src/main.rs\n\
//!              @@ -0,0 +1 @@\n\
//!              +fn main() {}\n";
//! let report = agent_sessions::diff::parse(patch);
//! assert_eq!(report.summary.created, 1);
//! assert_eq!(report.files[0].additions, 1);
//! ```
//!
//! ## Error handling
//!
//! All fallible operations return [`Result<T, AgentError>`](Result).
//! Rate-limited and transient network failures are retried under the
//! [`BackoffPolicy`]; authentication failures and other non-success
//! responses surface immediately. Unrecoverable errors cross the stream
//! boundary as a terminal `Err` item, never as a sentinel value.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod backoff;
pub mod batch;
pub mod cache;
pub mod diff;
pub mod error;
pub mod session;
pub mod stream;
pub mod types;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types for a flat public API
pub use api::{ActivityPage, PageFetcher, PageRequest, SessionApi};
pub use backoff::BackoffPolicy;
pub use batch::{BatchConfig, BatchOutcome, BatchReport, FailurePolicy, run_sessions};
pub use cache::{MemoryCache, SessionCache};
pub use diff::{ChangeSetSummary, ChangeType, DiffReport, ParsedFile};
pub use error::{AgentError, ErrorClass, Result};
pub use session::{SessionHandle, SessionInsights, SessionSnapshot};
pub use stream::{ActivityFilter, PollCursor, StreamMode, fetch_history, open_stream};
pub use types::{
    Activity, ActivityPayload, Artifact, BashOutput, ChangeSet, Media, Originator, PlanStep,
    Session, SessionState, StreamConfig,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
