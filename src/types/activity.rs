//! Activity and artifact type definitions
//!
//! An activity is one immutable event in a session's history. The remote
//! encodes the payload as mutually-exclusive optional fields; decoding goes
//! through a private raw struct and converts to a single tagged enum with
//! exactly one populated case.

use serde::{Deserialize, Serialize};

// ============================================================================
// Originator
// ============================================================================

/// Who produced an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Originator {
    /// The remote agent
    #[serde(alias = "agent")]
    Agent,
    /// The human (or calling program) driving the session
    #[serde(alias = "user")]
    User,
    /// The session runtime itself
    #[serde(alias = "system")]
    System,
}

impl Originator {
    /// Lowercase label, used in timelines and log lines
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::User => "user",
            Self::System => "system",
        }
    }
}

// ============================================================================
// Payload variants
// ============================================================================

/// One step of a generated plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// Step identifier
    #[serde(default)]
    pub id: String,
    /// Human-readable step title
    #[serde(default)]
    pub title: String,
    /// Position of the step within the plan
    #[serde(default)]
    pub index: u32,
}

/// The event carried by an activity
///
/// Exactly one variant is populated per activity; artifact-only activities
/// carry no payload at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityPayload {
    /// The agent sent a message
    AgentMessage {
        /// Message text
        message: String,
    },
    /// The user sent a message
    UserMessage {
        /// Message text
        message: String,
    },
    /// The agent generated (or regenerated) an execution plan
    PlanGenerated {
        /// Identifier of the generated plan
        plan_id: String,
        /// Ordered plan steps
        steps: Vec<PlanStep>,
    },
    /// A pending plan was approved
    PlanApproved {
        /// Identifier of the approved plan
        plan_id: String,
    },
    /// Progress report while the agent is working
    ProgressUpdate {
        /// Short progress title
        title: String,
        /// Optional longer description
        description: Option<String>,
    },
    /// The session finished successfully (terminal)
    SessionCompleted,
    /// The session failed (terminal)
    SessionFailed {
        /// Failure reason, if the remote provided one
        reason: Option<String>,
    },
}

// ============================================================================
// Artifacts
// ============================================================================

/// A code-change artifact carrying a raw unified-diff patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Identifier of the source the patch applies to
    #[serde(default)]
    pub source: String,
    /// Raw unified-diff text; absent for empty change sets
    #[serde(default)]
    pub code_diff: Option<String>,
}

impl ChangeSet {
    /// Parse the carried patch into per-file change records
    ///
    /// An absent patch yields an empty report.
    #[must_use]
    pub fn parse(&self) -> crate::diff::DiffReport {
        crate::diff::parse(self.code_diff.as_deref().unwrap_or(""))
    }
}

/// A media artifact (image, rendering, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// MIME type of the payload
    #[serde(default)]
    pub mime_type: String,
    /// Base64-encoded payload, if inlined
    #[serde(default)]
    pub data: Option<String>,
}

/// Captured output of a shell command the agent ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BashOutput {
    /// The command line that was executed
    #[serde(default)]
    pub command: String,
    /// Combined stdout/stderr
    #[serde(default)]
    pub output: String,
    /// Process exit code
    #[serde(default)]
    pub exit_code: i32,
}

/// A concrete output attached to an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A unified-diff change set
    ChangeSet(ChangeSet),
    /// A media payload
    Media(Media),
    /// Shell command output
    BashOutput(BashOutput),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    change_set: Option<ChangeSet>,
    media: Option<Media>,
    bash_output: Option<BashOutput>,
}

impl RawArtifact {
    fn into_artifact(self) -> Option<Artifact> {
        if let Some(change_set) = self.change_set {
            Some(Artifact::ChangeSet(change_set))
        } else if let Some(media) = self.media {
            Some(Artifact::Media(media))
        } else {
            self.bash_output.map(Artifact::BashOutput)
        }
    }
}

// ============================================================================
// Activity
// ============================================================================

/// One immutable event in a session's history
///
/// Activities are produced by the remote service and only read by this
/// library; they are never mutated after creation. `create_time` is an
/// RFC 3339 string used both for display and as a sortable key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawActivity")]
pub struct Activity {
    /// Unique identifier within the session
    pub id: String,
    /// RFC 3339 creation timestamp
    pub create_time: String,
    /// Who produced the activity
    pub originator: Option<Originator>,
    /// The event payload; `None` for artifact-only activities
    pub payload: Option<ActivityPayload>,
    /// Concrete outputs attached to this activity
    pub artifacts: Vec<Artifact>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivity {
    #[serde(alias = "name", default)]
    id: String,
    #[serde(default)]
    create_time: String,
    #[serde(default)]
    originator: Option<Originator>,
    agent_messaged: Option<RawMessage>,
    user_messaged: Option<RawMessage>,
    plan_generated: Option<RawPlanGenerated>,
    plan_approved: Option<RawPlanApproved>,
    progress_updated: Option<RawProgressUpdate>,
    session_completed: Option<serde_json::Value>,
    session_failed: Option<RawSessionFailed>,
    #[serde(default)]
    artifacts: Vec<RawArtifact>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(alias = "agentMessage", alias = "userMessage", default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlanGenerated {
    #[serde(default)]
    plan_id: String,
    #[serde(default)]
    steps: Vec<PlanStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlanApproved {
    #[serde(default)]
    plan_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgressUpdate {
    #[serde(default)]
    title: String,
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionFailed {
    #[serde(alias = "title")]
    reason: Option<String>,
}

impl From<RawActivity> for Activity {
    fn from(raw: RawActivity) -> Self {
        let payload = if let Some(m) = raw.agent_messaged {
            Some(ActivityPayload::AgentMessage { message: m.message })
        } else if let Some(m) = raw.user_messaged {
            Some(ActivityPayload::UserMessage { message: m.message })
        } else if let Some(p) = raw.plan_generated {
            Some(ActivityPayload::PlanGenerated {
                plan_id: p.plan_id,
                steps: p.steps,
            })
        } else if let Some(p) = raw.plan_approved {
            Some(ActivityPayload::PlanApproved { plan_id: p.plan_id })
        } else if let Some(p) = raw.progress_updated {
            Some(ActivityPayload::ProgressUpdate {
                title: p.title,
                description: p.description,
            })
        } else if raw.session_completed.is_some() {
            Some(ActivityPayload::SessionCompleted)
        } else {
            raw.session_failed
                .map(|f| ActivityPayload::SessionFailed { reason: f.reason })
        };

        Self {
            id: raw.id,
            create_time: raw.create_time,
            originator: raw.originator,
            payload,
            artifacts: raw
                .artifacts
                .into_iter()
                .filter_map(RawArtifact::into_artifact)
                .collect(),
        }
    }
}

impl Activity {
    /// Construct an activity with the given identity and no payload
    ///
    /// Mostly useful for tests and fakes; production activities come from
    /// the wire decoder.
    pub fn new(
        id: impl Into<String>,
        create_time: impl Into<String>,
        originator: Originator,
    ) -> Self {
        Self {
            id: id.into(),
            create_time: create_time.into(),
            originator: Some(originator),
            payload: None,
            artifacts: Vec::new(),
        }
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload(mut self, payload: ActivityPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach an artifact
    #[must_use]
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// The message text, if this activity carries one
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            Some(
                ActivityPayload::AgentMessage { message }
                | ActivityPayload::UserMessage { message },
            ) => Some(message),
            _ => None,
        }
    }

    /// Whether this activity ends an automated stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.payload,
            Some(ActivityPayload::SessionCompleted | ActivityPayload::SessionFailed { .. })
        )
    }

    /// Short label for the payload kind, used in timelines and counts
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match &self.payload {
            Some(ActivityPayload::AgentMessage { .. }) => "agent_message",
            Some(ActivityPayload::UserMessage { .. }) => "user_message",
            Some(ActivityPayload::PlanGenerated { .. }) => "plan_generated",
            Some(ActivityPayload::PlanApproved { .. }) => "plan_approved",
            Some(ActivityPayload::ProgressUpdate { .. }) => "progress_update",
            Some(ActivityPayload::SessionCompleted) => "session_completed",
            Some(ActivityPayload::SessionFailed { .. }) => "session_failed",
            None => "artifact",
        }
    }

    /// Iterate over the change-set artifacts attached to this activity
    pub fn change_sets(&self) -> impl Iterator<Item = &ChangeSet> {
        self.artifacts.iter().filter_map(|artifact| match artifact {
            Artifact::ChangeSet(cs) => Some(cs),
            _ => None,
        })
    }
}
