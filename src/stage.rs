//! Workflow stage projection.
//!
//! The backend owns stage state; this module is a pure projection of its
//! stage-status document onto the fixed ordered stage sequence for
//! navigation rendering. Nothing here is stored client-side as a source of
//! truth, and an inconsistent document degrades to a plausible view rather
//! than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The fixed, ordered issue-resolution workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Deployment,
    Planning,
    Implementation,
    Testing,
    Handoff,
}

impl WorkflowStage {
    /// All stages in workflow order.
    pub fn all() -> &'static [WorkflowStage] {
        &[
            WorkflowStage::Deployment,
            WorkflowStage::Planning,
            WorkflowStage::Implementation,
            WorkflowStage::Testing,
            WorkflowStage::Handoff,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Planning => "planning",
            Self::Implementation => "implementation",
            Self::Testing => "testing",
            Self::Handoff => "handoff",
        }
    }

    /// Human-readable label for navigation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::Planning => "Planning",
            Self::Implementation => "Implementation",
            Self::Testing => "Testing",
            Self::Handoff => "Handoff",
        }
    }

    /// Position in the workflow order.
    pub fn index(&self) -> usize {
        match self {
            Self::Deployment => 0,
            Self::Planning => 1,
            Self::Implementation => 2,
            Self::Testing => 3,
            Self::Handoff => 4,
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deployment" => Ok(Self::Deployment),
            "planning" => Ok(Self::Planning),
            "implementation" => Ok(Self::Implementation),
            "testing" => Ok(Self::Testing),
            "handoff" => Ok(Self::Handoff),
            _ => Err(format!("Invalid workflow stage: {}", s)),
        }
    }
}

/// Derived navigation status of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageNavStatus {
    Complete,
    Active,
    Upcoming,
    Blocked,
}

impl StageNavStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for StageNavStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage record inside the backend document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Resolution states in which the workflow's wrap-up is done.
const TERMINAL_RESOLUTION_STATES: &[&str] = &["ready_for_pr", "pr_created", "completed"];

/// The backend's stage-status document for one issue resolution.
///
/// Every field is optional: documents from older backends, or for runs
/// that have barely started, arrive sparse and must still project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageStatusResponse {
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub deployment: Option<StageRecord>,
    #[serde(default)]
    pub planning: Option<StageRecord>,
    #[serde(default)]
    pub implementation: Option<StageRecord>,
    #[serde(default)]
    pub testing: Option<StageRecord>,
    #[serde(default)]
    pub handoff: Option<StageRecord>,
    #[serde(default)]
    pub resolution_state: Option<String>,
    #[serde(default)]
    pub pr_number: Option<i64>,
    #[serde(default)]
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Deployment task backing the deployment stage's log view.
    #[serde(default)]
    pub deployment_task_id: Option<String>,
    /// Chat session backing the planning/implementation log views.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl StageStatusResponse {
    pub fn record(&self, stage: WorkflowStage) -> Option<&StageRecord> {
        match stage {
            WorkflowStage::Deployment => self.deployment.as_ref(),
            WorkflowStage::Planning => self.planning.as_ref(),
            WorkflowStage::Implementation => self.implementation.as_ref(),
            WorkflowStage::Testing => self.testing.as_ref(),
            WorkflowStage::Handoff => self.handoff.as_ref(),
        }
    }

    /// Lenient view of `current_stage`: an unknown value projects as "no
    /// current stage" instead of failing the whole document.
    pub fn current(&self) -> Option<WorkflowStage> {
        self.current_stage.as_deref().and_then(|s| s.parse().ok())
    }

    fn stage_complete(&self, stage: WorkflowStage) -> bool {
        self.record(stage).map(|r| r.complete).unwrap_or(false)
    }

    /// Whether the overall resolution has reached its terminal set, or a
    /// PR already exists.
    pub fn is_resolution_terminal(&self) -> bool {
        if self.pr_number.is_some() {
            return true;
        }
        self.resolution_state
            .as_deref()
            .is_some_and(|s| TERMINAL_RESOLUTION_STATES.contains(&s))
    }
}

/// Ordered stage descriptor for navigation rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageNavItem {
    pub stage: WorkflowStage,
    pub label: String,
    pub status: StageNavStatus,
    /// Coarse display value for a progress bar width; not a measurement.
    pub progress: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Blocked stages cannot be entered and render unselectable.
    pub disabled: bool,
}

/// Project the backend document onto the fixed stage sequence.
pub fn project_stages(doc: &StageStatusResponse) -> Vec<StageNavItem> {
    let current_idx = doc.current().map(|s| s.index());

    WorkflowStage::all()
        .iter()
        .map(|&stage| {
            let status = if stage == WorkflowStage::Handoff {
                handoff_status(doc)
            } else {
                linear_status(stage, current_idx, doc)
            };
            let record = doc.record(stage);
            StageNavItem {
                stage,
                label: stage.label().to_string(),
                status,
                progress: display_progress(status),
                started_at: record.and_then(|r| r.started_at),
                completed_at: record.and_then(|r| r.completed_at),
                disabled: status == StageNavStatus::Blocked,
            }
        })
        .collect()
}

/// Status of the first four stages: the record's own completion flag always
/// wins; otherwise compare against the current stage's index.
fn linear_status(
    stage: WorkflowStage,
    current_idx: Option<usize>,
    doc: &StageStatusResponse,
) -> StageNavStatus {
    if doc.stage_complete(stage) {
        return StageNavStatus::Complete;
    }
    let Some(current_idx) = current_idx else {
        return StageNavStatus::Upcoming;
    };
    match stage.index().cmp(&current_idx) {
        std::cmp::Ordering::Less => StageNavStatus::Complete,
        std::cmp::Ordering::Equal => {
            if doc.error_message.is_some() {
                StageNavStatus::Blocked
            } else {
                StageNavStatus::Active
            }
        }
        std::cmp::Ordering::Greater => StageNavStatus::Upcoming,
    }
}

/// Handoff is gated by testing: done once the resolution is terminal (or a
/// PR exists), enterable once testing completes, locked otherwise.
fn handoff_status(doc: &StageStatusResponse) -> StageNavStatus {
    if doc.is_resolution_terminal() || doc.stage_complete(WorkflowStage::Handoff) {
        StageNavStatus::Complete
    } else if doc.stage_complete(WorkflowStage::Testing) {
        StageNavStatus::Active
    } else {
        StageNavStatus::Blocked
    }
}

fn display_progress(status: StageNavStatus) -> u8 {
    match status {
        StageNavStatus::Complete => 100,
        StageNavStatus::Active => 50,
        StageNavStatus::Blocked => 35,
        StageNavStatus::Upcoming => 0,
    }
}

/// Aggregate progress: share of completed stages, rounded.
pub fn overall_progress(items: &[StageNavItem]) -> u8 {
    if items.is_empty() {
        return 0;
    }
    let complete = items
        .iter()
        .filter(|i| i.status == StageNavStatus::Complete)
        .count();
    ((complete as f64 / items.len() as f64) * 100.0).round() as u8
}

/// Which event feed backs the log view for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSource {
    Deployment,
    ChatSession,
}

/// The deployment stage reads deployment hooks; every later stage reads the
/// chat-session feed.
pub fn hook_source_for(stage: WorkflowStage) -> HookSource {
    match stage {
        WorkflowStage::Deployment => HookSource::Deployment,
        _ => HookSource::ChatSession,
    }
}

/// Tracks which stage the view shows.
///
/// Follows the active stage across refreshes until the user picks one
/// manually; from then on automatic follow is suppressed for the session so
/// polling never yanks the view away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSelection {
    selected: Option<WorkflowStage>,
    pinned: bool,
}

impl StageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manual pick: selects the stage and suppresses auto-follow.
    pub fn select(&mut self, stage: WorkflowStage) {
        self.selected = Some(stage);
        self.pinned = true;
    }

    /// Follow the active stage from a fresh projection, unless pinned.
    pub fn follow(&mut self, active: Option<WorkflowStage>) {
        if !self.pinned && active.is_some() {
            self.selected = active;
        }
    }

    pub fn selected(&self) -> Option<WorkflowStage> {
        self.selected
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}
