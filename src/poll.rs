//! Polling cadence policy and the watch loops.
//!
//! The loops here own the refresh cadence per data source; everything they
//! hand to `on_update` was rebuilt wholesale from the latest complete
//! snapshot. A failed fetch keeps the previous view ("stale but present"),
//! and overlapping fetches for one source are coalesced by a request gate:
//! a tick that fires while the previous fetch is still in flight is
//! skipped, so the in-flight response wins.

use crate::client::{SnapshotSource, TaskSummary};
use crate::stage::{HookSource, StageNavItem, StageStatusResponse, hook_source_for, project_stages};
use crate::steps::{GroupOptions, Step, build_steps};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deployment lifecycle states reported by the backend for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Pending,
    Deploying,
    Deployed,
    Failed,
    Unknown,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse with an `Unknown` fallback: the token comes
    /// from the backend un-normalized and must never fail the poll cycle.
    pub fn parse_lenient(s: &str) -> Self {
        s.to_lowercase().parse().unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "deploying" => Ok(Self::Deploying),
            "deployed" | "completed" => Ok(Self::Deployed),
            "failed" | "error" => Ok(Self::Failed),
            _ => Err(format!("Invalid deployment status: {}", s)),
        }
    }
}

/// Refresh cadence per view and data source.
///
/// These are the observed defaults, kept as configuration rather than hard
/// law; `config::FileConfig` can override each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Deployment hooks while the deployment is actively running.
    pub deploy_active: Duration,
    /// Deployment hooks once the deployment has left `pending`.
    pub deploy_settled: Duration,
    /// Chat/session hooks while a session exists.
    pub chat: Duration,
    /// Stage-status document while an issue-resolution id is known.
    pub stage: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            deploy_active: Duration::from_secs(2),
            deploy_settled: Duration::from_secs(5),
            chat: Duration::from_secs(3),
            stage: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    /// Cadence for a task's deployment hooks; `None` while the deployment
    /// is still `pending` (nothing to show yet).
    pub fn deployment_interval(&self, status: DeploymentStatus) -> Option<Duration> {
        match status {
            DeploymentStatus::Deploying => Some(self.deploy_active),
            DeploymentStatus::Pending => None,
            _ => Some(self.deploy_settled),
        }
    }

    /// Cadence for chat-session hooks; `None` until a session id exists.
    pub fn chat_interval(&self, session_id: Option<&str>) -> Option<Duration> {
        match session_id {
            Some(id) if !id.is_empty() => Some(self.chat),
            _ => None,
        }
    }

    /// Cadence for the stage-status document.
    pub fn stage_interval(&self, issue_known: bool) -> Option<Duration> {
        issue_known.then_some(self.stage)
    }
}

/// In-flight fetch de-duplication, keyed on source+id.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    inflight: Arc<Mutex<HashSet<String>>>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the key, or `None` if a fetch for it is already outstanding.
    /// The claim is released when the returned guard drops.
    pub fn try_begin(&self, key: &str) -> Option<InFlightGuard> {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !inflight.insert(key.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            inflight: Arc::clone(&self.inflight),
            key: key.to_string(),
        })
    }
}

pub struct InFlightGuard {
    inflight: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inflight.remove(&self.key);
    }
}

/// One refresh of the deployment log view.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentView {
    pub task: TaskSummary,
    pub steps: Vec<Step>,
}

/// One refresh of the issue-resolution view.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueView {
    pub doc: StageStatusResponse,
    pub stages: Vec<StageNavItem>,
    /// Steps from whichever feed backs the active stage; stale-but-present
    /// when the latest hook fetch failed.
    pub steps: Vec<Step>,
    pub feed: Option<HookSource>,
}

/// Watch a task's deployment log until the caller drops the future.
///
/// Cadence follows the task's deployment status every cycle: active
/// deployments poll fast, settled ones slow, and a still-pending deployment
/// shows the waiting state without polling hooks at all.
pub async fn watch_deployment<S, F>(
    source: S,
    task_id: String,
    opts: GroupOptions,
    policy: PollPolicy,
    limit: u32,
    mut on_update: F,
) where
    S: SnapshotSource + Sync,
    F: FnMut(DeploymentView),
{
    let gate = RequestGate::new();
    let hooks_key = format!("deployment-hooks:{}", task_id);

    loop {
        let task = match source.task(&task_id).await {
            Ok(task) => task,
            Err(err) => {
                tracing::warn!("task fetch failed: {}; keeping previous view", err);
                tokio::time::sleep(policy.deploy_settled).await;
                continue;
            }
        };

        let Some(interval) = policy.deployment_interval(task.deployment_status()) else {
            on_update(DeploymentView {
                task,
                steps: Vec::new(),
            });
            tokio::time::sleep(policy.deploy_settled).await;
            continue;
        };

        if let Some(_guard) = gate.try_begin(&hooks_key) {
            match source.deployment_hooks(&task_id, limit).await {
                Ok(snapshot) => {
                    let snapshot = snapshot.into_normalized();
                    let steps = build_steps(&snapshot.hooks, &opts);
                    on_update(DeploymentView { task, steps });
                }
                Err(err) => {
                    tracing::warn!("hook fetch failed: {}; keeping previous snapshot", err);
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Watch an issue resolution: the stage document at its own cadence, plus
/// whichever hook feed backs the currently active stage.
pub async fn watch_issue<S, F>(
    source: S,
    project_id: String,
    issue_id: String,
    opts: GroupOptions,
    policy: PollPolicy,
    limit: u32,
    mut on_update: F,
) where
    S: SnapshotSource + Sync,
    F: FnMut(IssueView),
{
    let gate = RequestGate::new();
    let doc_key = format!("stage-status:{}/{}", project_id, issue_id);

    let mut doc: Option<StageStatusResponse> = None;
    let mut last_doc_fetch: Option<tokio::time::Instant> = None;
    let mut steps_cache: Vec<Step> = Vec::new();
    let mut feed_cache: Option<HookSource> = None;

    loop {
        let doc_due = last_doc_fetch
            .map(|at| at.elapsed() >= policy.stage)
            .unwrap_or(true);
        if doc_due {
            if let Some(_guard) = gate.try_begin(&doc_key) {
                match source.stage_status(&project_id, &issue_id).await {
                    Ok(fresh) => doc = Some(fresh),
                    Err(err) => {
                        tracing::warn!("stage-status fetch failed: {}; keeping previous", err);
                    }
                }
                last_doc_fetch = Some(tokio::time::Instant::now());
            }
        }

        let Some(current_doc) = doc.clone() else {
            tokio::time::sleep(policy.stage).await;
            continue;
        };

        let mut interval = policy.stage;
        match current_doc.current().map(hook_source_for) {
            Some(HookSource::Deployment) => {
                if let Some(task_id) = current_doc.deployment_task_id.as_deref() {
                    feed_cache = Some(HookSource::Deployment);
                    interval = policy.deploy_active;
                    let key = format!("deployment-hooks:{}", task_id);
                    if let Some(_guard) = gate.try_begin(&key) {
                        match source.deployment_hooks(task_id, limit).await {
                            Ok(snapshot) => {
                                steps_cache =
                                    build_steps(&snapshot.into_normalized().hooks, &opts);
                            }
                            Err(err) => {
                                tracing::warn!("hook fetch failed: {}; keeping previous", err);
                            }
                        }
                    }
                }
            }
            Some(HookSource::ChatSession) => {
                if let Some(chat_interval) =
                    policy.chat_interval(current_doc.session_id.as_deref())
                {
                    let session_id = current_doc.session_id.as_deref().unwrap_or_default();
                    feed_cache = Some(HookSource::ChatSession);
                    interval = chat_interval;
                    let key = format!("session-hooks:{}", session_id);
                    if let Some(_guard) = gate.try_begin(&key) {
                        match source.session_hooks(session_id, limit).await {
                            Ok(snapshot) => {
                                steps_cache =
                                    build_steps(&snapshot.into_normalized().hooks, &opts);
                            }
                            Err(err) => {
                                tracing::warn!("hook fetch failed: {}; keeping previous", err);
                            }
                        }
                    }
                }
            }
            None => {}
        }

        on_update(IssueView {
            stages: project_stages(&current_doc),
            doc: current_doc,
            steps: steps_cache.clone(),
            feed: feed_cache,
        });

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClientError;
    use crate::hook::{HookData, HookEvent, HookSnapshot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_deployment_interval_table() {
        let policy = PollPolicy::default();
        assert_eq!(
            policy.deployment_interval(DeploymentStatus::Deploying),
            Some(Duration::from_secs(2))
        );
        assert_eq!(policy.deployment_interval(DeploymentStatus::Pending), None);
        assert_eq!(
            policy.deployment_interval(DeploymentStatus::Deployed),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            policy.deployment_interval(DeploymentStatus::Failed),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_chat_interval_requires_session() {
        let policy = PollPolicy::default();
        assert_eq!(policy.chat_interval(None), None);
        assert_eq!(policy.chat_interval(Some("")), None);
        assert_eq!(
            policy.chat_interval(Some("sess-1")),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_stage_interval_requires_issue() {
        let policy = PollPolicy::default();
        assert_eq!(policy.stage_interval(false), None);
        assert_eq!(policy.stage_interval(true), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_deployment_status_parse_lenient() {
        assert_eq!(
            DeploymentStatus::parse_lenient("DEPLOYING"),
            DeploymentStatus::Deploying
        );
        assert_eq!(
            DeploymentStatus::parse_lenient("completed"),
            DeploymentStatus::Deployed
        );
        assert_eq!(
            DeploymentStatus::parse_lenient("???"),
            DeploymentStatus::Unknown
        );
    }

    #[test]
    fn test_request_gate_coalesces_same_key() {
        let gate = RequestGate::new();
        let guard = gate.try_begin("stage-status:p/1");
        assert!(guard.is_some());
        assert!(gate.try_begin("stage-status:p/1").is_none());
        // A different source+id is independent.
        assert!(gate.try_begin("stage-status:p/2").is_some());

        drop(guard);
        assert!(gate.try_begin("stage-status:p/1").is_some());
    }

    #[derive(Clone)]
    struct CannedSource {
        status: &'static str,
        task_calls: Arc<AtomicUsize>,
        hook_calls: Arc<AtomicUsize>,
    }

    impl CannedSource {
        fn new(status: &'static str) -> Self {
            Self {
                status,
                task_calls: Arc::new(AtomicUsize::new(0)),
                hook_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for CannedSource {
        async fn task(&self, task_id: &str) -> Result<TaskSummary, ClientError> {
            self.task_calls.fetch_add(1, Ordering::SeqCst);
            Ok(TaskSummary {
                id: task_id.to_string(),
                name: None,
                deployment_status: Some(self.status.to_string()),
            })
        }

        async fn deployment_hooks(
            &self,
            _task_id: &str,
            _limit: u32,
        ) -> Result<HookSnapshot, ClientError> {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
            Ok(HookSnapshot {
                hooks: vec![HookEvent {
                    id: "1".to_string(),
                    hook_type: "status".to_string(),
                    phase: None,
                    status: None,
                    message: Some("Cloning".to_string()),
                    data: HookData::default(),
                    received_at: "2026-02-01T10:00:00Z".parse().unwrap(),
                    is_complete: None,
                }],
            })
        }

        async fn session_hooks(
            &self,
            _session_id: &str,
            _limit: u32,
        ) -> Result<HookSnapshot, ClientError> {
            Ok(HookSnapshot::default())
        }

        async fn stage_status(
            &self,
            _project_id: &str,
            _issue_id: &str,
        ) -> Result<StageStatusResponse, ClientError> {
            Ok(StageStatusResponse::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_deployment_emits_rebuilt_steps() {
        let source = CannedSource::new("deploying");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let handle = tokio::spawn(watch_deployment(
            source.clone(),
            "t1".to_string(),
            GroupOptions::default(),
            PollPolicy::default(),
            100,
            move |view: DeploymentView| {
                let _ = tx.send(view);
            },
        ));

        let view = rx.recv().await.expect("view update");
        handle.abort();

        assert_eq!(view.task.id, "t1");
        assert_eq!(view.steps.len(), 1);
        assert_eq!(view.steps[0].step_name, "Cloning");
        assert!(source.hook_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_deployment_pending_skips_hook_polling() {
        let source = CannedSource::new("pending");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let handle = tokio::spawn(watch_deployment(
            source.clone(),
            "t1".to_string(),
            GroupOptions::default(),
            PollPolicy::default(),
            100,
            move |view: DeploymentView| {
                let _ = tx.send(view);
            },
        ));

        let view = rx.recv().await.expect("view update");
        handle.abort();

        assert!(view.steps.is_empty());
        assert_eq!(source.hook_calls.load(Ordering::SeqCst), 0);
    }
}
