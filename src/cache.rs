//! Local session cache collaborator
//!
//! The streaming core never mutates storage itself; it only writes
//! through via [`crate::session::SessionHandle::sync_to_cache`]. The
//! trait is deliberately narrow so file or embedded-SQL backends can be
//! plugged in without touching the core; only the in-memory backend
//! ships here.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::types::{Activity, Session};

/// Narrow storage interface for session metadata and activity history
///
/// Implementations must be safe for concurrent access to independent
/// keys.
pub trait SessionCache: Send + Sync {
    /// Record session metadata
    ///
    /// # Errors
    /// Returns an error if the backend cannot persist the record
    fn put_session(&self, session: Session) -> impl Future<Output = Result<()>> + Send;

    /// Look up cached session metadata
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn get_session(&self, session_id: &str)
    -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Record the full activity history for a session, replacing any
    /// previous record
    ///
    /// # Errors
    /// Returns an error if the backend cannot persist the record
    fn put_activities(
        &self,
        session_id: &str,
        activities: Vec<Activity>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Look up the cached activity history for a session
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn get_activities(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Vec<Activity>>> + Send;
}

/// In-memory cache backend
#[derive(Debug, Default)]
pub struct MemoryCache {
    sessions: Mutex<HashMap<String, Session>>,
    activities: Mutex<HashMap<String, Vec<Activity>>>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCache for MemoryCache {
    async fn put_session(&self, session: Session) -> Result<()> {
        self.sessions.lock().await.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.lock().await.get(session_id).cloned())
    }

    async fn put_activities(&self, session_id: &str, activities: Vec<Activity>) -> Result<()> {
        self.activities
            .lock()
            .await
            .insert(session_id.to_string(), activities);
        Ok(())
    }

    async fn get_activities(&self, session_id: &str) -> Result<Vec<Activity>> {
        Ok(self
            .activities
            .lock()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Originator, SessionState};

    #[tokio::test]
    async fn round_trips_sessions_and_activities() {
        let cache = MemoryCache::new();
        let session = Session {
            id: "sessions/s1".to_string(),
            title: None,
            state: SessionState::InProgress,
            url: None,
        };

        cache.put_session(session.clone()).await.unwrap();
        assert_eq!(cache.get_session("sessions/s1").await.unwrap(), Some(session));
        assert_eq!(cache.get_session("sessions/zz").await.unwrap(), None);

        let history = vec![Activity::new("a1", "2026-08-01T10:00:00Z", Originator::Agent)];
        cache.put_activities("sessions/s1", history.clone()).await.unwrap();
        assert_eq!(cache.get_activities("sessions/s1").await.unwrap(), history);
        assert!(cache.get_activities("sessions/zz").await.unwrap().is_empty());
    }
}
