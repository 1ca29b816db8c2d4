//! Fold an ordered hook stream into steps.
//!
//! One left-to-right pass: each hook resolves (or creates) its group by
//! derived key, is appended to the group's members, and the group's status
//! and totals are re-aggregated. Group keys keep first-seen order. No hook
//! is ever dropped from the model, even when it looks administratively
//! redundant.

use crate::classify;
use crate::hook::{HookEvent, PhaseFilter};
use crate::steps::{Step, rollup};
use std::collections::HashMap;

/// Hook types that are semantically one-shot: status/progress pings and
/// fine-grained AI events. Merging them by label would collapse unrelated
/// occurrences of e.g. "Assistant" into one step.
const ONE_SHOT_HOOK_TYPES: &[&str] = &["status", "query"];

/// Caller-selected grouping policy for one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Isolation mode: give every `status`/`query` hook its own singleton
    /// group instead of merging by label.
    pub isolate_status_and_query: bool,
    /// Applied to the stream before grouping.
    pub phase_filter: PhaseFilter,
}

/// Fold hooks into steps, preserving first-seen key order.
///
/// The input is expected in `received_at` order (see
/// [`crate::hook::HookSnapshot::normalize`]); the fold itself just walks it
/// left to right.
pub fn group_hooks(hooks: &[HookEvent], opts: &GroupOptions) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for hook in hooks.iter().filter(|h| opts.phase_filter.matches(h)) {
        let label = classify::step_label(hook);
        let (key, name) = if opts.isolate_status_and_query
            && ONE_SHOT_HOOK_TYPES.contains(&hook.hook_type.as_str())
        {
            let name = format!("{} · {}", label, hook.received_at.format("%H:%M:%S"));
            (hook.id.clone(), name)
        } else {
            (label.clone(), label)
        };

        let idx = match index.get(&key) {
            Some(&idx) => idx,
            None => {
                steps.push(Step::new(key.clone(), name, hook.received_at));
                index.insert(key, steps.len() - 1);
                steps.len() - 1
            }
        };
        rollup::absorb(&mut steps[idx], hook.clone());
    }

    steps
}

/// Fold and finalize in one call: the shape every view consumes.
pub fn build_steps(hooks: &[HookEvent], opts: &GroupOptions) -> Vec<Step> {
    let mut steps = group_hooks(hooks, opts);
    rollup::finalize_steps(&mut steps);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookData;
    use crate::steps::StepStatus;
    use serde_json::{Value, json};

    fn hook(id: &str, hook_type: &str, received_at: &str, data: Value) -> HookEvent {
        let data = match data {
            Value::Object(map) => HookData(map),
            _ => panic!("Expected JSON object"),
        };
        HookEvent {
            id: id.to_string(),
            hook_type: hook_type.to_string(),
            phase: None,
            status: None,
            message: None,
            data,
            received_at: received_at.parse().unwrap(),
            is_complete: None,
        }
    }

    #[test]
    fn test_same_label_merges_into_one_step() {
        let hooks = vec![
            hook("1", "status", "2026-02-01T10:00:00Z", json!({"step_name": "Clone repo"})),
            hook("2", "status", "2026-02-01T10:00:05Z", json!({"step_name": "Clone repo"})),
        ];
        let steps = group_hooks(&hooks, &GroupOptions::default());
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "Clone repo");
        assert_eq!(steps[0].hooks.len(), 2);
    }

    #[test]
    fn test_group_keys_keep_first_seen_order() {
        let hooks = vec![
            hook("1", "status", "2026-02-01T10:00:00Z", json!({"step_name": "Clone repo"})),
            hook("2", "status", "2026-02-01T10:00:01Z", json!({"step_name": "Install deps"})),
            hook("3", "status", "2026-02-01T10:00:02Z", json!({"step_name": "Clone repo"})),
        ];
        let steps = group_hooks(&hooks, &GroupOptions::default());
        let names: Vec<&str> = steps.iter().map(|s| s.step_name.as_str()).collect();
        assert_eq!(names, vec!["Clone repo", "Install deps"]);
        assert_eq!(steps[0].hooks.len(), 2);
    }

    #[test]
    fn test_isolation_mode_produces_singleton_groups() {
        let hooks = vec![
            hook("1", "status", "2026-02-01T10:00:00Z", json!({"step_name": "Probe"})),
            hook("2", "status", "2026-02-01T10:00:05Z", json!({"step_name": "Probe"})),
        ];

        let merged = group_hooks(&hooks, &GroupOptions::default());
        assert_eq!(merged.len(), 1);

        let opts = GroupOptions {
            isolate_status_and_query: true,
            ..GroupOptions::default()
        };
        let isolated = group_hooks(&hooks, &opts);
        assert_eq!(isolated.len(), 2);
        assert_eq!(isolated[0].id, "1");
        assert_eq!(isolated[1].id, "2");
        assert_eq!(isolated[0].step_name, "Probe · 10:00:00");
        assert_eq!(isolated[1].step_name, "Probe · 10:00:05");
    }

    #[test]
    fn test_isolation_mode_leaves_other_types_merged() {
        let hooks = vec![
            hook("1", "provision", "2026-02-01T10:00:00Z", json!({"step_name": "Build"})),
            hook("2", "provision", "2026-02-01T10:00:05Z", json!({"step_name": "Build"})),
        ];
        let opts = GroupOptions {
            isolate_status_and_query: true,
            ..GroupOptions::default()
        };
        let steps = group_hooks(&hooks, &opts);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].hooks.len(), 2);
    }

    #[test]
    fn test_refold_is_idempotent() {
        let hooks = vec![
            hook("1", "status", "2026-02-01T10:00:00Z", json!({"step_name": "Clone repo"})),
            hook("2", "query", "2026-02-01T10:00:01Z", json!({"message_type": "AssistantMessage"})),
            hook("3", "status", "2026-02-01T10:00:02Z", json!({"step_name": "Clone repo"})),
        ];
        let opts = GroupOptions::default();
        let first = build_steps(&hooks, &opts);
        let second = build_steps(&hooks, &opts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_phase_filter_applies_before_grouping() {
        let mut init = hook("1", "setup", "2026-02-01T10:00:00Z", json!({}));
        init.phase = Some(crate::hook::DeployPhase::Initialization);
        let mut deploy = hook("2", "rollout", "2026-02-01T10:00:01Z", json!({}));
        deploy.phase = Some(crate::hook::DeployPhase::Deployment);

        let hooks = vec![init, deploy];
        let opts = GroupOptions {
            phase_filter: PhaseFilter::Deployment,
            ..GroupOptions::default()
        };
        let steps = group_hooks(&hooks, &opts);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "rollout");
    }

    #[test]
    fn test_empty_input_yields_no_steps() {
        let steps = build_steps(&[], &GroupOptions::default());
        assert!(steps.is_empty());
    }

    #[test]
    fn test_totals_accumulate_and_zero_is_omitted() {
        let hooks = vec![
            hook(
                "1",
                "provision",
                "2026-02-01T10:00:00Z",
                json!({"step_name": "Build", "duration_ms": 1200, "total_cost_usd": 0.02}),
            ),
            hook(
                "2",
                "provision",
                "2026-02-01T10:00:05Z",
                json!({"step_name": "Build", "duration_ms": 800}),
            ),
        ];
        let steps = group_hooks(&hooks, &GroupOptions::default());
        assert_eq!(steps[0].total_duration_ms, Some(2000));
        assert_eq!(steps[0].total_cost_usd, Some(0.02));

        let bare = vec![hook("3", "provision", "2026-02-01T10:00:00Z", json!({"step_name": "Build"}))];
        let steps = group_hooks(&bare, &GroupOptions::default());
        assert_eq!(steps[0].total_duration_ms, None);
        assert_eq!(steps[0].total_cost_usd, None);
    }

    #[test]
    fn test_statuses_from_scenario_fold() {
        let mut running = hook("1", "status", "2026-02-01T10:00:00Z", json!({"step_name": "Clone repo"}));
        running.status = Some("running".to_string());
        let mut done = hook("2", "status", "2026-02-01T10:00:09Z", json!({"step_name": "Clone repo"}));
        done.status = Some("COMPLETED".to_string());

        let steps = group_hooks(&[running, done], &GroupOptions::default());
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(
            steps[0].end_time,
            Some("2026-02-01T10:00:09Z".parse().unwrap())
        );
    }
}
