//! Hook event wire model.
//!
//! A `HookEvent` is an immutable fact emitted by the backend while a
//! deployment or an AI session runs. Events arrive only via polling, as
//! whole snapshots; identity (`id`) is stable and fields are append-only
//! truth — later polls may reveal additional hooks but never mutate one.
//!
//! The payload `data` bag is deliberately open: its shape varies by hook
//! type and backend version. `HookData` keeps the raw JSON object and
//! layers defensive typed accessors on top, and `HookEvent::kind` derives a
//! tagged classification over the known shapes with a fallback that still
//! carries the bag for the generic preview/chip path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Macro-phase that produced a deployment hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    Initialization,
    Deployment,
}

impl DeployPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Deployment => "deployment",
        }
    }
}

impl std::fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialization" => Ok(Self::Initialization),
            "deployment" => Ok(Self::Deployment),
            _ => Err(format!("Invalid deploy phase: {}", s)),
        }
    }
}

/// Tri-state filter applied to the hook stream before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFilter {
    #[default]
    All,
    Initialization,
    Deployment,
}

impl PhaseFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Initialization => "initialization",
            Self::Deployment => "deployment",
        }
    }

    /// Whether a hook passes this filter. Hooks without a `phase` (chat
    /// hooks) only pass under `All`.
    pub fn matches(&self, hook: &HookEvent) -> bool {
        match self {
            Self::All => true,
            Self::Initialization => hook.phase == Some(DeployPhase::Initialization),
            Self::Deployment => hook.phase == Some(DeployPhase::Deployment),
        }
    }
}

impl std::fmt::Display for PhaseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "initialization" => Ok(Self::Initialization),
            "deployment" => Ok(Self::Deployment),
            _ => Err(format!(
                "Invalid phase filter '{}'. Valid values: all, initialization, deployment",
                s
            )),
        }
    }
}

/// Token usage reported inside a hook payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// The open payload bag of a hook.
///
/// Keeps the raw JSON object (document order preserved) and exposes
/// defensive accessors: absent keys, wrong types, and nested gaps all
/// degrade to `None`, never to an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookData(pub Map<String, Value>);

impl HookData {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn step_name(&self) -> Option<&str> {
        self.get_str("step_name")
    }

    pub fn message_type(&self) -> Option<&str> {
        self.get_str("message_type")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_str("content_type")
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.get_str("tool_name")
    }

    pub fn tool_input(&self) -> Option<&Value> {
        self.0.get("tool_input")
    }

    pub fn result(&self) -> Option<&Value> {
        self.0.get("result")
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.0.get("metadata")
    }

    pub fn error(&self) -> Option<&Value> {
        self.0.get("error")
    }

    /// Whether the payload carries a truthy `error` value. Backends emit
    /// anything from a string to a structured object here; empty strings,
    /// zero, `false`, and `null` all count as "no error".
    pub fn has_error(&self) -> bool {
        self.error().is_some_and(is_truthy)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        let value = self.0.get("duration_ms")?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f.max(0.0) as u64))
    }

    pub fn total_cost_usd(&self) -> Option<f64> {
        self.0.get("total_cost_usd").and_then(Value::as_f64)
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        let value = self.0.get("usage")?;
        Some(TokenUsage {
            input_tokens: value.get("input_tokens").and_then(Value::as_u64).unwrap_or(0),
            output_tokens: value.get("output_tokens").and_then(Value::as_u64).unwrap_or(0),
        })
    }
}

/// Truthiness for loosely-typed backend fields: `null`, `false`, `0`, and
/// `""` mean "no value"; arrays and objects always count as present.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// An immutable fact about something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    /// Unique, stable identifier; grouping tie-breaker and reconciliation key.
    pub id: String,
    /// Coarse category (`status`, `query`, `error`, tool-execution, ...).
    pub hook_type: String,
    /// Macro-phase, only present on deployment hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DeployPhase>,
    /// Free-text status token, deliberately un-normalized (`ERROR`,
    /// `FAILED`, `COMPLETED`, `completed`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "HookData::is_empty")]
    pub data: HookData,
    /// Ingestion timestamp (server clock); the only reliable ordering key.
    pub received_at: DateTime<Utc>,
    /// Explicit terminal flag; authoritative when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

/// Message-body markers that count as completion evidence (case-sensitive).
const COMPLETION_MARKERS: &[&str] = &["completed", "succeeded", "successfully", "✓"];

/// Status tokens that flag a failed member (case-sensitive by contract:
/// lowercase `failed` from the backend means something else).
const ERROR_STATUSES: &[&str] = &["ERROR", "FAILED"];

const COMPLETED_STATUSES: &[&str] = &["COMPLETED", "completed"];

impl HookEvent {
    /// Derived classification over the known payload shapes.
    pub fn kind(&self) -> HookKind<'_> {
        match self.hook_type.as_str() {
            "query" => match self.data.content_type() {
                Some("tool_use") => HookKind::ToolUse {
                    tool: self.data.tool_name(),
                },
                Some("tool_result") => HookKind::ToolResult {
                    tool: self.data.tool_name(),
                },
                _ => match self.data.message_type() {
                    Some("AssistantMessage") => HookKind::Assistant,
                    Some("UserMessage") => HookKind::User,
                    Some("SystemMessage") => HookKind::System,
                    Some("ResultMessage") => HookKind::RunResult,
                    _ => HookKind::Query,
                },
            },
            "status" => HookKind::Status,
            "error" => HookKind::Error,
            _ => HookKind::Other,
        }
    }

    /// Whether this member flags its step as failed.
    pub fn has_error_signal(&self) -> bool {
        if self
            .status
            .as_deref()
            .is_some_and(|s| ERROR_STATUSES.contains(&s))
        {
            return true;
        }
        self.data.has_error()
    }

    /// Whether this member carries completion evidence: the explicit
    /// terminal flag, a completed status token, or a success marker in the
    /// message body.
    pub fn has_completion_signal(&self) -> bool {
        if self.is_complete == Some(true) {
            return true;
        }
        if self.data.get("is_complete").is_some_and(is_truthy) {
            return true;
        }
        if self
            .status
            .as_deref()
            .is_some_and(|s| COMPLETED_STATUSES.contains(&s))
        {
            return true;
        }
        self.message
            .as_deref()
            .is_some_and(|m| COMPLETION_MARKERS.iter().any(|marker| m.contains(marker)))
    }
}

/// Tagged view of a hook's payload shape.
///
/// The `Query`/`Status`/`Error`/`Other` fallbacks still carry the raw bag
/// (via the owning event), so the generic preview and chip paths keep
/// working for shapes this enum does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind<'a> {
    ToolUse { tool: Option<&'a str> },
    ToolResult { tool: Option<&'a str> },
    Assistant,
    User,
    System,
    RunResult,
    Query,
    Status,
    Error,
    Other,
}

/// One poll's worth of hooks, fully replacing the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookSnapshot {
    #[serde(default)]
    pub hooks: Vec<HookEvent>,
}

impl HookSnapshot {
    /// Enforce the ordering precondition instead of trusting the source:
    /// `received_at` ascending, `id` as tie-break.
    pub fn normalize(&mut self) {
        self.hooks.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    pub fn into_normalized(mut self) -> Self {
        self.normalize();
        self
    }
}
