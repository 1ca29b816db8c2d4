//! Hook classification: step labels, one-line previews, and detail chips.
//!
//! Everything here is a pure function of a single `HookEvent`. Field access
//! is defensive throughout — a sparse or oddly-shaped payload degrades to
//! omission, never to an error — and values that should be strings but
//! arrive as structures are JSON-stringified rather than rejected.

use crate::hook::{HookEvent, HookKind};
use serde::Serialize;
use serde_json::Value;

const ELLIPSIS: &str = "...";

/// Character cap for one-line previews (ellipsis excluded).
const MAX_SUMMARY_CHARS: usize = 220;

/// Character cap for chip values: anything longer than 42 characters is cut
/// to 39 plus the ellipsis.
const MAX_CHIP_VALUE_CHARS: usize = 39;

/// Upper bound on chips per hook.
const MAX_CHIPS: usize = 4;

/// Deployment payload keys worth surfacing before the generic field scan.
const DEPLOYMENT_DETAIL_KEYS: &[&str] = &[
    "branch",
    "organization_name",
    "project_name",
    "github_repo_url",
    "webhook_url",
    "deployment_host",
    "environment",
    "target",
    "framework",
];

/// Payload keys consulted, in order, for the generic (non-query) preview.
const FALLBACK_SUMMARY_KEYS: &[&str] = &["status", "description", "summary", "step_name"];

/// A key/label/value triple for compact hook summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailChip {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// Derive the display label of the step that owns this hook.
///
/// Priority: an explicit `step_name` that differs from the hook type wins;
/// `query` hooks are labelled from their content/message type; `status`
/// hooks fall back to their message; everything else is labelled by its
/// hook type.
pub fn step_label(hook: &HookEvent) -> String {
    if let Some(step_name) = hook.data.step_name() {
        if !step_name.eq_ignore_ascii_case(&hook.hook_type) {
            return step_name.to_string();
        }
    }

    match hook.hook_type.as_str() {
        "query" => query_label(hook),
        "status" => hook
            .message
            .clone()
            .or_else(|| hook.data.step_name().map(str::to_string))
            .unwrap_or_else(|| "Status Update".to_string()),
        "" => "Deployment Step".to_string(),
        other => other.to_string(),
    }
}

fn query_label(hook: &HookEvent) -> String {
    match hook.kind() {
        HookKind::ToolUse { tool } => tool_label("Tool Use", tool),
        HookKind::ToolResult { tool } => tool_label("Tool Result", tool),
        HookKind::Assistant => "Assistant".to_string(),
        HookKind::User => "User".to_string(),
        HookKind::System => "System".to_string(),
        HookKind::RunResult => "Result".to_string(),
        _ => {
            if hook.hook_type.is_empty() {
                "Query".to_string()
            } else {
                hook.hook_type.clone()
            }
        }
    }
}

fn tool_label(prefix: &str, tool: Option<&str>) -> String {
    match tool {
        Some(tool) => format!("{} · {}", prefix, tool),
        None => prefix.to_string(),
    }
}

/// Derive the one-line preview for a hook.
///
/// Query hooks prefer tool input/result text, then the message, then a
/// category-specific fallback; other hooks use the message, then the first
/// present scalar of `status`/`description`/`summary`/`step_name`.
pub fn summary_message(hook: &HookEvent) -> String {
    let text = match hook.kind() {
        HookKind::ToolUse { tool } => tool_use_summary(hook, tool),
        HookKind::ToolResult { .. } => hook
            .data
            .result()
            .map(value_text)
            .or_else(|| hook.message.clone())
            .unwrap_or_else(|| "Tool result received".to_string()),
        HookKind::Assistant => hook
            .message
            .clone()
            .unwrap_or_else(|| "Assistant response".to_string()),
        HookKind::User => hook
            .message
            .clone()
            .unwrap_or_else(|| "User message".to_string()),
        HookKind::System => hook
            .message
            .clone()
            .unwrap_or_else(|| "System message".to_string()),
        HookKind::RunResult => hook
            .message
            .clone()
            .or_else(|| hook.data.result().map(value_text))
            .unwrap_or_else(|| "Run finished".to_string()),
        HookKind::Query => hook.message.clone().unwrap_or_default(),
        HookKind::Status | HookKind::Error | HookKind::Other => generic_summary(hook),
    };
    truncate(&text, MAX_SUMMARY_CHARS)
}

fn tool_use_summary(hook: &HookEvent, tool: Option<&str>) -> String {
    match hook.data.tool_input() {
        Some(input) => {
            let text = value_text(input);
            match tool {
                Some(tool) => format!("{}: {}", tool, text),
                None => text,
            }
        }
        None => hook
            .message
            .clone()
            .unwrap_or_else(|| "Tool invocation".to_string()),
    }
}

fn generic_summary(hook: &HookEvent) -> String {
    if let Some(message) = &hook.message {
        return message.clone();
    }
    for key in FALLBACK_SUMMARY_KEYS {
        if let Some(text) = hook.data.get(key).and_then(scalar_text) {
            return text;
        }
    }
    String::new()
}

/// Collect up to four key/label/value chips for a hook.
///
/// Attempt order: the event's own `status`/`phase`/`hook_type`, then the
/// payload's `message_type`/`content_type`/`tool_name`, then the deployment
/// priority keys, then every remaining scalar payload field in document
/// order. Objects and arrays are never rendered as chips.
pub fn detail_chips(hook: &HookEvent) -> Vec<DetailChip> {
    let mut chips: Vec<DetailChip> = Vec::new();

    push_chip(&mut chips, "status", hook.status.clone());
    push_chip(&mut chips, "phase", hook.phase.map(|p| p.as_str().to_string()));
    push_chip(
        &mut chips,
        "hook_type",
        (!hook.hook_type.is_empty()).then(|| hook.hook_type.clone()),
    );

    for key in ["message_type", "content_type", "tool_name"] {
        push_chip(&mut chips, key, hook.data.get(key).and_then(scalar_text));
    }

    for key in DEPLOYMENT_DETAIL_KEYS {
        push_chip(&mut chips, key, hook.data.get(key).and_then(scalar_text));
    }

    for (key, value) in hook.data.iter() {
        if chips.len() >= MAX_CHIPS {
            break;
        }
        if chips.iter().any(|c| c.key == *key) {
            continue;
        }
        push_chip(&mut chips, key, scalar_text(value));
    }

    chips
}

fn push_chip(chips: &mut Vec<DetailChip>, key: &str, value: Option<String>) {
    if chips.len() >= MAX_CHIPS {
        return;
    }
    let Some(value) = value else { return };
    if value.is_empty() {
        return;
    }
    chips.push(DetailChip {
        key: key.to_string(),
        label: chip_label(key),
        value: truncate(&value, MAX_CHIP_VALUE_CHARS),
    });
}

/// Display label for a chip key: a fixed map for the well-known keys and a
/// title-cased fallback for everything else.
fn chip_label(key: &str) -> String {
    match key {
        "status" => "Status",
        "phase" => "Phase",
        "hook_type" => "Hook",
        "message_type" => "Message",
        "content_type" => "Content",
        "tool_name" => "Tool",
        "branch" => "Branch",
        "organization_name" => "Organization",
        "project_name" => "Project",
        "github_repo_url" => "Repository",
        "webhook_url" => "Webhook",
        "deployment_host" => "Host",
        "environment" => "Environment",
        "target" => "Target",
        "framework" => "Framework",
        other => return title_case(other),
    }
    .to_string()
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a payload value for display: strings verbatim, scalars via their
/// JSON form, structures as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scalar rendering: strings, numbers, and booleans only.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Truncate to `keep` characters plus an ellipsis; strings already within
/// `keep + ellipsis` are returned unchanged.
fn truncate(s: &str, keep: usize) -> String {
    if s.chars().count() <= keep + ELLIPSIS.chars().count() {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(keep).collect();
        out.push_str(ELLIPSIS);
        out
    }
}
