//! Derived session snapshot
//!
//! Pure derivation over metadata plus the full activity history:
//! activity-type counts, a human-readable timeline, a small set of
//! behavioral insights, and the parsed generated-files view.

use std::collections::BTreeMap;

use crate::diff::{self, DiffReport};
use crate::types::{Activity, ActivityPayload, Artifact, Session};

/// Behavioral observations over a session's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionInsights {
    /// Terminal activities observed (completed or failed)
    pub completion_attempts: usize,
    /// Plan generations beyond the first
    pub plan_regenerations: usize,
    /// Messages sent by the user after the session started
    pub user_interventions: usize,
    /// Shell-command artifacts that exited non-zero
    pub failed_commands: usize,
}

/// Point-in-time view over one session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Session metadata at snapshot time
    pub session: Session,
    /// Full activity history, deduplicated and time-ordered
    pub activities: Vec<Activity>,
    /// Count of activities per payload kind
    pub counts: BTreeMap<String, usize>,
    /// One human-readable line per activity
    pub timeline: Vec<String>,
    /// Behavioral observations
    pub insights: SessionInsights,
    /// Parsed view of the most recent change set, with reconstructed
    /// content
    pub generated_files: DiffReport,
}

impl SessionSnapshot {
    /// Derive a snapshot from metadata and history
    #[must_use]
    pub fn build(session: Session, activities: Vec<Activity>) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut insights = SessionInsights::default();
        let mut timeline = Vec::with_capacity(activities.len());
        let mut plan_generations = 0usize;
        let mut latest_patch: Option<&str> = None;

        for activity in &activities {
            *counts.entry(activity.kind().to_string()).or_insert(0) += 1;
            timeline.push(describe(activity));

            match &activity.payload {
                Some(ActivityPayload::PlanGenerated { .. }) => plan_generations += 1,
                Some(ActivityPayload::UserMessage { .. }) => insights.user_interventions += 1,
                Some(
                    ActivityPayload::SessionCompleted | ActivityPayload::SessionFailed { .. },
                ) => insights.completion_attempts += 1,
                _ => {}
            }
            for artifact in &activity.artifacts {
                match artifact {
                    Artifact::BashOutput(bash) if bash.exit_code != 0 => {
                        insights.failed_commands += 1;
                    }
                    Artifact::ChangeSet(cs) => {
                        if let Some(patch) = cs.code_diff.as_deref() {
                            latest_patch = Some(patch);
                        }
                    }
                    _ => {}
                }
            }
        }
        insights.plan_regenerations = plan_generations.saturating_sub(1);

        let generated_files = diff::parse_with_content(latest_patch.unwrap_or(""));

        Self {
            session,
            counts,
            timeline,
            insights,
            generated_files,
            activities,
        }
    }
}

/// Render one timeline line for an activity
fn describe(activity: &Activity) -> String {
    let who = activity.originator.map_or("unknown", |o| o.as_str());
    let detail = match &activity.payload {
        Some(
            ActivityPayload::AgentMessage { message } | ActivityPayload::UserMessage { message },
        ) => first_line(message),
        Some(ActivityPayload::PlanGenerated { plan_id, steps }) => {
            return format!(
                "{} [{who}] {}: plan {plan_id} with {} steps",
                activity.create_time,
                activity.kind(),
                steps.len()
            );
        }
        Some(ActivityPayload::PlanApproved { plan_id }) => plan_id.as_str(),
        Some(ActivityPayload::ProgressUpdate { title, .. }) => title.as_str(),
        Some(ActivityPayload::SessionFailed { reason }) => {
            reason.as_deref().unwrap_or("no reason given")
        }
        Some(ActivityPayload::SessionCompleted) => "",
        None => return format!(
            "{} [{who}] {} artifact(s)",
            activity.create_time,
            activity.artifacts.len()
        ),
    };
    format!("{} [{who}] {}: {detail}", activity.create_time, activity.kind())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
