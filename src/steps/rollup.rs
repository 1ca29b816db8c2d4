//! Per-step status aggregation and the linear finalization pass.
//!
//! Aggregation is recomputed on every member addition. Error evidence is
//! sticky-exclusive: once any member flags an error the step stays `error`
//! even if later members look successful, and error is checked before
//! completion in the same evaluation.

use crate::hook::HookEvent;
use crate::steps::{Step, StepStatus};

/// Append a member to a step and re-aggregate status and totals.
///
/// `end_time` is set from the appended member's `received_at` the first
/// time the step leaves `running`; afterwards it is never overwritten, so
/// a late error member upgrades the status without moving the timestamp.
pub(crate) fn absorb(step: &mut Step, hook: HookEvent) {
    let received = hook.received_at;
    step.hooks.push(hook);

    let next = evaluate(&step.hooks);
    if next.is_terminal() && step.end_time.is_none() {
        step.end_time = Some(received);
    }
    step.status = next;

    accumulate_totals(step);
}

/// Roll member evidence up into one status. Error dominates completion;
/// anything else is still running.
fn evaluate(hooks: &[HookEvent]) -> StepStatus {
    if hooks.iter().any(HookEvent::has_error_signal) {
        return StepStatus::Error;
    }
    if hooks.iter().any(HookEvent::has_completion_signal) {
        return StepStatus::Completed;
    }
    StepStatus::Running
}

fn accumulate_totals(step: &mut Step) {
    let duration: u64 = step.hooks.iter().filter_map(|h| h.data.duration_ms()).sum();
    step.total_duration_ms = (duration > 0).then_some(duration);

    let cost: f64 = step
        .hooks
        .iter()
        .filter_map(|h| h.data.total_cost_usd())
        .sum();
    step.total_cost_usd = (cost > 0.0).then_some(cost);
}

/// Close out stale `running` steps once a later step has begun.
///
/// A later step starting is taken as proof the former step ended, even
/// without an explicit terminal event — some backends never emit one. The
/// last step is exempt: it legitimately stays `running` indefinitely. This
/// is a fallback signal only; steps that already left `running` (and their
/// `end_time`) are never touched.
pub fn finalize_steps(steps: &mut [Step]) {
    let len = steps.len();
    for i in 0..len.saturating_sub(1) {
        if steps[i].status != StepStatus::Running {
            continue;
        }
        if steps[i + 1].hooks.is_empty() {
            continue;
        }
        let successor_start = steps[i + 1].start_time;
        steps[i].status = StepStatus::Completed;
        if steps[i].end_time.is_none() {
            steps[i].end_time = Some(successor_start);
        }
    }
}

/// Format a wall-clock duration: `Ns` under a minute, `Mm Ss` otherwise.
pub fn format_duration_secs(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
