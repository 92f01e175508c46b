//! Continuous activity streaming
//!
//! Adapts the cursor-paginated, poll-only list endpoint into a
//! continuous, deduplicated, time-ordered stream of activities with
//! retry/backoff and cooperative cancellation.

mod adapter;
mod cursor;

pub use adapter::{fetch_history, open_stream};
pub use cursor::PollCursor;

use crate::types::{Activity, Originator};

/// Termination behavior of an open stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Never completes on its own; ends only through cancellation or an
    /// unrecoverable error
    Interactive,
    /// Ends after a terminal activity (session completed or failed) is
    /// observed
    Automated,
}

/// Caller-supplied filters applied after dedup bookkeeping
///
/// A filtered-out activity is still recorded as seen by the cursor, so
/// it is never re-yielded by a later page.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Suppress activities from this originator
    pub exclude_originator: Option<Originator>,
    /// Only yield activities created at or after this RFC 3339 timestamp
    pub since: Option<String>,
}

impl ActivityFilter {
    /// Whether the activity passes the filter
    #[must_use]
    pub fn accepts(&self, activity: &Activity) -> bool {
        if let Some(excluded) = self.exclude_originator {
            if activity.originator == Some(excluded) {
                return false;
            }
        }
        if let Some(since) = &self.since {
            if activity.create_time.as_str() < since.as_str() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_excludes_originator_and_old_timestamps() {
        let filter = ActivityFilter {
            exclude_originator: Some(Originator::User),
            since: Some("2026-08-01T10:00:00Z".to_string()),
        };

        let user = Activity::new("a", "2026-08-01T11:00:00Z", Originator::User);
        let early = Activity::new("b", "2026-08-01T09:00:00Z", Originator::Agent);
        let at_boundary = Activity::new("c", "2026-08-01T10:00:00Z", Originator::Agent);

        assert!(!filter.accepts(&user));
        assert!(!filter.accepts(&early));
        assert!(filter.accepts(&at_boundary));
    }
}
