//! Core type definitions for sessions, activities, and configuration

pub mod activity;
pub mod options;
pub mod session;

pub use activity::{
    Activity, ActivityPayload, Artifact, BashOutput, ChangeSet, Media, Originator, PlanStep,
};
pub use options::StreamConfig;
pub use session::{Session, SessionState};
