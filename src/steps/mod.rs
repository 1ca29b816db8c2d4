//! Derived step model: hooks folded into logical, stably-keyed groups.
//!
//! Steps are not transmitted by the backend — they are recomputed wholesale
//! from each polled snapshot. Re-running the fold over the same hook list
//! always yields the same steps (same keys, order, statuses), which is what
//! keeps the refreshing view stable across polls.

mod grouper;
mod rollup;

pub use grouper::{GroupOptions, build_steps, group_hooks};
pub use rollup::{finalize_steps, format_duration_secs};

use crate::hook::HookEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rollup status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// No members observed yet.
    #[default]
    Pending,
    /// Members exist but none carries terminal evidence.
    Running,
    Completed,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Check if the step has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid step status: {}", s)),
        }
    }
}

/// A named bucket of one or more hooks sharing a derived group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Group key: the derived label, or the member hook's own id in
    /// isolation mode.
    pub id: String,
    pub step_name: String,
    /// Members in fold order (`received_at` order of the source stream).
    pub hooks: Vec<HookEvent>,
    pub status: StepStatus,
    /// First member's `received_at`.
    pub start_time: DateTime<Utc>,
    /// Set once, on the first transition out of `running`; never
    /// overwritten afterwards.
    pub end_time: Option<DateTime<Utc>>,
    /// Sum of member `duration_ms` values; only recorded when > 0 so the
    /// view can omit zero-valued tiles.
    pub total_duration_ms: Option<u64>,
    /// Sum of member `total_cost_usd` values; only recorded when > 0.
    pub total_cost_usd: Option<f64>,
}

impl Step {
    pub(crate) fn new(id: String, step_name: String, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            step_name,
            hooks: Vec::new(),
            status: StepStatus::Pending,
            start_time,
            end_time: None,
            total_duration_ms: None,
            total_cost_usd: None,
        }
    }

    /// Wall-clock duration display: `Ns` / `Mm Ss` once finished,
    /// "In progress…" while the step has no end time.
    pub fn duration_display(&self) -> String {
        match self.end_time {
            Some(end) => {
                let secs = (end - self.start_time).num_seconds().max(0) as u64;
                format_duration_secs(secs)
            }
            None => "In progress…".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_roundtrip() {
        for s in &["pending", "running", "completed", "error"] {
            let parsed: StepStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<StepStatus>().is_err());
    }

    #[test]
    fn test_step_status_terminal() {
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Error.is_terminal());
        assert!(!StepStatus::Running.is_terminal());
        assert!(!StepStatus::Pending.is_terminal());
    }

    #[test]
    fn test_serde_produces_lowercase_strings() {
        assert_eq!(
            serde_json::to_string(&StepStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::from_str::<StepStatus>("\"error\"").unwrap(),
            StepStatus::Error
        );
    }

    #[test]
    fn test_duration_display() {
        let start: DateTime<Utc> = "2026-02-01T10:00:00Z".parse().unwrap();
        let mut step = Step::new("s".into(), "s".into(), start);
        assert_eq!(step.duration_display(), "In progress…");

        step.end_time = Some("2026-02-01T10:00:42Z".parse().unwrap());
        assert_eq!(step.duration_display(), "42s");

        step.end_time = Some("2026-02-01T10:02:05Z".parse().unwrap());
        assert_eq!(step.duration_display(), "2m 5s");
    }
}
