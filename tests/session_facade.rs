//! Integration tests for the session facade and the batch runner

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use agent_sessions::{
    Activity, ActivityPage, ActivityPayload, AgentError, Artifact, BackoffPolicy, BashOutput,
    BatchConfig, ChangeSet, FailurePolicy, MemoryCache, Originator, PageFetcher, PageRequest,
    Result, Session, SessionApi, SessionCache, SessionHandle, SessionState, StreamConfig,
    run_sessions,
};

/// Scripted fake for the full session API, keyed by session id
#[derive(Default)]
struct FakeApi {
    pages: Mutex<HashMap<String, VecDeque<Result<ActivityPage>>>>,
    // Metadata states returned in order; the last one repeats.
    states: Mutex<HashMap<String, VecDeque<SessionState>>>,
    sent: Mutex<Vec<(String, String)>>,
    approvals: Mutex<Vec<String>>,
}

impl FakeApi {
    fn with_pages(session_id: &str, pages: Vec<Result<ActivityPage>>) -> Self {
        let api = Self::default();
        api.pages
            .try_lock()
            .unwrap()
            .insert(session_id.to_string(), pages.into());
        api
    }

    fn add_pages(&self, session_id: &str, pages: Vec<Result<ActivityPage>>) {
        self.pages
            .try_lock()
            .unwrap()
            .insert(session_id.to_string(), pages.into());
    }

    fn add_states(&self, session_id: &str, states: Vec<SessionState>) {
        self.states
            .try_lock()
            .unwrap()
            .insert(session_id.to_string(), states.into());
    }
}

impl PageFetcher for FakeApi {
    async fn fetch_page(&self, request: PageRequest) -> Result<ActivityPage> {
        let mut pages = self.pages.lock().await;
        let queue = pages.entry(request.session_id).or_default();
        queue.pop_front().unwrap_or_else(|| Ok(ActivityPage::default()))
    }
}

impl SessionApi for FakeApi {
    async fn get_session(&self, session_id: &str) -> Result<Session> {
        let mut states = self.states.lock().await;
        let queue = states.entry(session_id.to_string()).or_default();
        let state = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().copied().unwrap_or(SessionState::Completed)
        };
        Ok(Session {
            id: session_id.to_string(),
            title: Some("scripted".to_string()),
            state,
            url: None,
        })
    }

    async fn approve_plan(&self, session_id: &str) -> Result<()> {
        self.approvals.lock().await.push(session_id.to_string());
        Ok(())
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((session_id.to_string(), message.to_string()));
        Ok(())
    }
}

fn fast_config() -> StreamConfig {
    StreamConfig::default()
        .poll_interval(Duration::from_millis(1))
        .backoff(BackoffPolicy {
            rate_limit_base: Duration::from_millis(1),
            rate_limit_cap: Duration::from_millis(2),
            rate_limit_budget: Duration::from_secs(5),
            transient_base: Duration::from_millis(1),
            transient_cap: Duration::from_millis(2),
            transient_budget: Duration::from_secs(5),
        })
}

fn page(activities: Vec<Activity>, next: Option<&str>) -> Result<ActivityPage> {
    Ok(ActivityPage {
        activities,
        next_page_token: next.map(str::to_string),
    })
}

// Replies are scripted far in the future so they always postdate the
// client-side send marker.
const FUTURE: &str = "2999-01-01T00:00:00Z";
const FUTURE_LATER: &str = "2999-01-01T00:00:01Z";

fn agent_message(id: &str, time: &str, text: &str) -> Activity {
    Activity::new(id, time, Originator::Agent).with_payload(ActivityPayload::AgentMessage {
        message: text.to_string(),
    })
}

fn terminal(id: &str, time: &str) -> Activity {
    Activity::new(id, time, Originator::System).with_payload(ActivityPayload::SessionCompleted)
}

#[tokio::test]
async fn approve_and_send_pass_through_to_the_api() {
    let api = Arc::new(FakeApi::default());
    let handle = SessionHandle::with_config(api.clone(), "sessions/s1", fast_config());

    tokio_test::assert_ok!(handle.approve_plan().await);
    tokio_test::assert_ok!(handle.send_message("go ahead").await);

    assert_eq!(*api.approvals.lock().await, ["sessions/s1"]);
    assert_eq!(
        *api.sent.lock().await,
        [("sessions/s1".to_string(), "go ahead".to_string())]
    );
}

#[tokio::test]
async fn ask_returns_first_reply_after_the_send_time() {
    let user_echo = Activity::new("u1", FUTURE, Originator::User).with_payload(
        ActivityPayload::UserMessage {
            message: "question".to_string(),
        },
    );
    let api = Arc::new(FakeApi::with_pages(
        "sessions/s1",
        vec![page(
            vec![
                user_echo,
                agent_message("a1", FUTURE_LATER, "the answer"),
                terminal("end", "2999-01-01T00:00:02Z"),
            ],
            None,
        )],
    ));
    let handle = SessionHandle::with_config(api.clone(), "sessions/s1", fast_config());

    let reply = handle.ask("question").await.unwrap();
    assert_eq!(reply.id, "a1");
    assert_eq!(reply.message(), Some("the answer"));
    assert_eq!(api.sent.lock().await.len(), 1);
}

#[tokio::test]
async fn ask_fails_when_the_stream_ends_without_a_reply() {
    let api = Arc::new(FakeApi::with_pages(
        "sessions/s1",
        vec![page(vec![terminal("end", FUTURE)], None)],
    ));
    let handle = SessionHandle::with_config(api, "sessions/s1", fast_config());

    let err = handle.ask("anyone there?").await.unwrap_err();
    assert!(matches!(err, AgentError::StreamEndedWithoutReply));
}

#[tokio::test]
async fn wait_until_terminal_polls_through_intermediate_states() {
    let api = Arc::new(FakeApi::default());
    api.add_states(
        "sessions/s1",
        vec![
            SessionState::Planning,
            SessionState::InProgress,
            SessionState::Completed,
        ],
    );
    let handle = SessionHandle::with_config(api, "sessions/s1", fast_config());

    let session = handle
        .wait_until_terminal(Duration::from_millis(1))
        .await
        .unwrap();
    assert_eq!(session.state, SessionState::Completed);
}

#[tokio::test]
async fn snapshot_combines_metadata_history_insights_and_files() {
    let patch = "diff --git a/gen.rs b/gen.rs\n--- /dev/null\n+++ b/gen.rs\n@@ -0,0 +1 @@\n+fn gen() {}\n";
    let api = Arc::new(FakeApi::default());
    api.add_states("sessions/s1", vec![SessionState::Completed]);
    api.add_pages(
        "sessions/s1",
        vec![
            page(
                vec![
                    Activity::new("a1", "2026-08-01T10:00:00Z", Originator::Agent).with_payload(
                        ActivityPayload::PlanGenerated {
                            plan_id: "p1".to_string(),
                            steps: Vec::new(),
                        },
                    ),
                    Activity::new("a2", "2026-08-01T10:01:00Z", Originator::Agent).with_artifact(
                        Artifact::BashOutput(BashOutput {
                            command: "make".to_string(),
                            output: "error".to_string(),
                            exit_code: 2,
                        }),
                    ),
                ],
                Some("t1"),
            ),
            page(
                vec![
                    Activity::new("a3", "2026-08-01T10:02:00Z", Originator::Agent).with_artifact(
                        Artifact::ChangeSet(ChangeSet {
                            source: "repo".to_string(),
                            code_diff: Some(patch.to_string()),
                        }),
                    ),
                    terminal("end", "2026-08-01T10:03:00Z"),
                ],
                None,
            ),
        ],
    );
    let handle = SessionHandle::with_config(api, "sessions/s1", fast_config());

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.session.state, SessionState::Completed);
    assert_eq!(snapshot.activities.len(), 4);
    assert_eq!(snapshot.counts.get("plan_generated"), Some(&1));
    assert_eq!(snapshot.counts.get("artifact"), Some(&2));
    assert_eq!(snapshot.insights.failed_commands, 1);
    assert_eq!(snapshot.insights.completion_attempts, 1);
    assert_eq!(snapshot.timeline.len(), 4);
    assert_eq!(snapshot.generated_files.files.len(), 1);
    assert_eq!(snapshot.generated_files.files[0].path, "gen.rs");
}

#[tokio::test]
async fn sync_to_cache_writes_metadata_and_history_through() {
    let api = Arc::new(FakeApi::default());
    api.add_states("sessions/s1", vec![SessionState::InProgress]);
    api.add_pages(
        "sessions/s1",
        vec![page(
            vec![agent_message("a1", "2026-08-01T10:00:00Z", "hi")],
            None,
        )],
    );
    let handle = SessionHandle::with_config(api, "sessions/s1", fast_config());
    let cache = MemoryCache::new();

    let count = handle.sync_to_cache(&cache).await.unwrap();
    assert_eq!(count, 1);

    let cached = cache.get_session("sessions/s1").await.unwrap().unwrap();
    assert_eq!(cached.state, SessionState::InProgress);
    let history = cache.get_activities("sessions/s1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "a1");
}

#[tokio::test]
async fn batch_collects_individual_failures_without_aborting_siblings() {
    let api = Arc::new(FakeApi::default());
    api.add_pages(
        "sessions/good",
        vec![page(
            vec![
                agent_message("a1", "2026-08-01T10:00:00Z", "working"),
                terminal("end", "2026-08-01T10:01:00Z"),
            ],
            None,
        )],
    );
    api.add_pages("sessions/bad", vec![Err(AgentError::auth("key rejected"))]);
    api.add_states("sessions/good", vec![SessionState::Completed]);

    let config = BatchConfig {
        concurrency: 2,
        stagger: Some(Duration::from_millis(1)),
        failure_policy: FailurePolicy::CollectErrors,
        stream: fast_config(),
    };
    let report = run_sessions(
        api,
        vec!["sessions/good".to_string(), "sessions/bad".to_string()],
        config,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].session_id, "sessions/good");
    assert_eq!(report.outcomes[0].final_state, SessionState::Completed);
    assert_eq!(report.outcomes[0].activities_seen, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "sessions/bad");
    assert!(matches!(report.failures[0].1, AgentError::Auth(_)));
}

#[tokio::test]
async fn batch_fails_fast_on_the_first_error() {
    let api = Arc::new(FakeApi::default());
    api.add_pages("sessions/bad", vec![Err(AgentError::auth("key rejected"))]);
    // The sibling never terminates on its own; fail-fast must cancel it.
    api.add_pages("sessions/slow", Vec::new());

    let config = BatchConfig {
        concurrency: 2,
        stagger: None,
        failure_policy: FailurePolicy::FailFast,
        stream: fast_config(),
    };
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        run_sessions(
            api,
            vec!["sessions/bad".to_string(), "sessions/slow".to_string()],
            config,
            CancellationToken::new(),
        ),
    )
    .await
    .expect("fail-fast batch must not hang")
    .unwrap_err();

    assert!(matches!(err, AgentError::Auth(_)));
}
