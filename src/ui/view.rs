//! Pure render functions over the derived view models.
//!
//! Everything renders to a `String` so views are testable without a
//! terminal, and all per-render UI state (filter, expansion, selection)
//! arrives as an explicit immutable `ViewState` — nothing ambient.

use crate::classify;
use crate::stage::{StageNavItem, StageNavStatus, overall_progress};
use crate::steps::{Step, StepStatus};
use crate::ui::icons::{ACTIVE, CHECK, CLOCK, COST, CROSS, LOCKED, PENDING, RUNNING, UPCOMING};
use console::style;
use std::collections::HashSet;

/// Explicit per-render UI state.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Step ids whose member hooks are rendered expanded.
    pub expanded: HashSet<String>,
    /// When set, every step renders expanded.
    pub verbose: bool,
}

impl ViewState {
    pub fn is_expanded(&self, step_id: &str) -> bool {
        self.verbose || self.expanded.contains(step_id)
    }
}

/// Render the step log. An empty model renders the waiting state rather
/// than nothing — "no steps yet" is a normal condition, not an error.
pub fn render_steps(steps: &[Step], state: &ViewState) -> String {
    if steps.is_empty() {
        return render_empty_state();
    }

    let mut out = String::new();
    for step in steps {
        out.push_str(&render_step_line(step));
        out.push('\n');
        if state.is_expanded(&step.id) {
            for hook in &step.hooks {
                let summary = classify::summary_message(hook);
                if summary.is_empty() {
                    continue;
                }
                out.push_str(&format!("    {}\n", style(summary).dim()));
            }
            let chips = step.hooks.last().map(classify::detail_chips).unwrap_or_default();
            if !chips.is_empty() {
                out.push_str(&format!("    {}\n", style(render_chips(&chips)).dim()));
            }
        }
    }
    out.pop();
    out
}

fn render_step_line(step: &Step) -> String {
    let icon = match step.status {
        StepStatus::Completed => CHECK,
        StepStatus::Error => CROSS,
        StepStatus::Running => RUNNING,
        StepStatus::Pending => PENDING,
    };
    let name = match step.status {
        StepStatus::Error => style(&step.step_name).red().bold(),
        StepStatus::Completed => style(&step.step_name).green(),
        _ => style(&step.step_name).cyan(),
    };

    let mut line = format!("{}{} {}", icon, name, style(step.duration_display()).dim());
    if let Some(duration_ms) = step.total_duration_ms {
        line.push_str(&format!(
            "  {}{}",
            CLOCK,
            style(crate::steps::format_duration_secs(duration_ms / 1000)).dim()
        ));
    }
    if let Some(cost) = step.total_cost_usd {
        line.push_str(&format!("  {}{}", COST, style(format!("${:.4}", cost)).dim()));
    }
    if step.hooks.len() > 1 {
        line.push_str(&format!("  {}", style(format!("({} events)", step.hooks.len())).dim()));
    }
    line
}

/// The waiting/empty state shown before any hooks exist.
pub fn render_empty_state() -> String {
    format!("{}", style("Waiting for jobs…").dim())
}

/// Render the stage navigation with the aggregate progress line.
pub fn render_stage_nav(items: &[StageNavItem]) -> String {
    let mut out = String::new();
    out.push_str(&render_progress_line(overall_progress(items)));
    out.push('\n');

    for item in items {
        let (icon, label) = match item.status {
            StageNavStatus::Complete => (CHECK, style(&item.label).green()),
            StageNavStatus::Active => (ACTIVE, style(&item.label).cyan().bold()),
            StageNavStatus::Blocked => (LOCKED, style(&item.label).red()),
            StageNavStatus::Upcoming => (UPCOMING, style(&item.label).dim()),
        };
        out.push_str(&format!(
            "{}{} {}",
            icon,
            label,
            style(format!("({})", item.status)).dim()
        ));
        if item.disabled {
            out.push_str(&format!(" {}", style("· locked").dim()));
        }
        out.push('\n');
    }
    out.pop();
    out
}

fn render_progress_line(progress: u8) -> String {
    const WIDTH: usize = 20;
    let filled = (progress as usize * WIDTH) / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));
    format!("{} {}%", style(bar).cyan(), progress)
}

/// Chips joined into one compact line.
pub fn render_chips(chips: &[classify::DetailChip]) -> String {
    chips
        .iter()
        .map(|chip| format!("{}: {}", chip.label, chip.value))
        .collect::<Vec<_>>()
        .join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{StageStatusResponse, project_stages};
    use chrono::DateTime;

    fn step(name: &str, status: StepStatus) -> Step {
        let start: DateTime<chrono::Utc> = "2026-02-01T10:00:00Z".parse().unwrap();
        let mut step = Step::new(name.to_string(), name.to_string(), start);
        step.status = status;
        step
    }

    #[test]
    fn test_empty_steps_render_waiting_state() {
        let rendered = render_steps(&[], &ViewState::default());
        assert!(rendered.contains("Waiting for jobs…"));
    }

    #[test]
    fn test_steps_render_one_line_each() {
        let steps = vec![
            step("Clone repo", StepStatus::Completed),
            step("Build", StepStatus::Running),
        ];
        let rendered = render_steps(&steps, &ViewState::default());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Clone repo"));
        assert!(lines[1].contains("Build"));
        assert!(lines[1].contains("In progress…"));
    }

    #[test]
    fn test_stage_nav_renders_all_stages_and_progress() {
        let doc = StageStatusResponse {
            current_stage: Some("planning".to_string()),
            ..StageStatusResponse::default()
        };
        let items = project_stages(&doc);
        let rendered = render_stage_nav(&items);
        for label in ["Deployment", "Planning", "Implementation", "Testing", "Handoff"] {
            assert!(rendered.contains(label), "missing {label}");
        }
        assert!(rendered.contains("20%"));
        assert!(rendered.contains("locked"));
    }

    #[test]
    fn test_chips_join_with_separator() {
        let chips = vec![
            classify::DetailChip {
                key: "status".to_string(),
                label: "Status".to_string(),
                value: "running".to_string(),
            },
            classify::DetailChip {
                key: "branch".to_string(),
                label: "Branch".to_string(),
                value: "main".to_string(),
            },
        ];
        assert_eq!(render_chips(&chips), "Status: running · Branch: main");
    }
}
