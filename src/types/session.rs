//! Session metadata types

use serde::{Deserialize, Serialize};

/// Remote lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// State not reported by the remote
    #[default]
    StateUnspecified,
    /// Accepted but not yet started
    Queued,
    /// The agent is drafting a plan
    Planning,
    /// A plan is waiting for approval
    AwaitingPlanApproval,
    /// The agent is executing the plan
    InProgress,
    /// Execution paused, waiting for user input
    Paused,
    /// Finished successfully (terminal)
    Completed,
    /// Finished with an error (terminal)
    Failed,
}

impl SessionState {
    /// Whether this state ends the session
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Metadata for one remote agent session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Resource identifier of the session
    #[serde(alias = "name")]
    pub id: String,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Current lifecycle state
    #[serde(default)]
    pub state: SessionState,
    /// Link to the session in the remote UI, when available
    #[serde(default)]
    pub url: Option<String>,
}
