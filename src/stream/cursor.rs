//! Polling cursor state
//!
//! Tracks page-token progress and the high-water mark used for
//! deduplication across polls. One cursor is owned by exactly one open
//! stream and never shared.

use std::collections::HashSet;

use crate::types::Activity;

/// Per-stream cursor: page token plus high-water dedup state
///
/// The dedup is deliberately two-level and cheap: a high-water timestamp
/// bucket plus an id set scoped to that bucket. It assumes the remote
/// orders pages by non-decreasing `create_time` and that duplicate
/// deliveries recur only within the same or an adjacent poll. The id set
/// resets whenever the timestamp advances, so same-timestamp activities
/// spanning two different poll cycles may be delivered in either mutual
/// order.
#[derive(Debug, Clone, Default)]
pub struct PollCursor {
    /// Opaque cursor for the next page, if a previous fetch returned one
    pub page_token: Option<String>,
    /// Latest `create_time` seen; empty before the first activity
    pub high_water_time: String,
    /// Ids already seen at exactly `high_water_time`
    pub ids_at_high_water: HashSet<String>,
}

impl PollCursor {
    /// Create a cursor at the empty high-water mark
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an activity, returning whether it is fresh
    ///
    /// Timestamps strictly below the high-water mark are stale; at the
    /// mark, the id set decides; above it, the mark advances and the id
    /// set resets to just this activity.
    pub fn observe(&mut self, activity: &Activity) -> bool {
        match activity.create_time.as_str().cmp(self.high_water_time.as_str()) {
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.ids_at_high_water.insert(activity.id.clone()),
            std::cmp::Ordering::Greater => {
                self.high_water_time.clone_from(&activity.create_time);
                self.ids_at_high_water.clear();
                self.ids_at_high_water.insert(activity.id.clone());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Originator;

    fn activity(id: &str, time: &str) -> Activity {
        Activity::new(id, time, Originator::Agent)
    }

    #[test]
    fn first_activity_is_fresh() {
        let mut cursor = PollCursor::new();
        assert!(cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
        assert_eq!(cursor.high_water_time, "2026-08-01T10:00:00Z");
    }

    #[test]
    fn duplicate_id_at_same_timestamp_is_stale() {
        let mut cursor = PollCursor::new();
        assert!(cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
        assert!(!cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
        assert!(cursor.observe(&activity("a2", "2026-08-01T10:00:00Z")));
    }

    #[test]
    fn earlier_timestamp_is_stale() {
        let mut cursor = PollCursor::new();
        assert!(cursor.observe(&activity("a2", "2026-08-01T10:00:05Z")));
        assert!(!cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
    }

    #[test]
    fn advancing_resets_the_id_set() {
        let mut cursor = PollCursor::new();
        assert!(cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
        assert!(cursor.observe(&activity("a2", "2026-08-01T10:00:05Z")));
        assert_eq!(cursor.ids_at_high_water.len(), 1);
        assert!(cursor.ids_at_high_water.contains("a2"));
        // a1's id is forgotten once the mark advances; only its timestamp
        // keeps it stale.
        assert!(!cursor.observe(&activity("a1", "2026-08-01T10:00:00Z")));
    }
}
