//! Event vocabulary for the shared log.
//!
//! An [`Event`] is one immutable row: base fields at the top level and an
//! open `metadata` JSON map. Stored metadata stays opaque
//! [`serde_json::Value`] so unknown producers can attach anything; typed
//! access is opt-in via the per-kind views ([`InjectionMeta`],
//! [`KnowledgeMeta`], [`ApprovalMeta`]), which default absent or
//! wrong-typed fields instead of erroring. Validation happens at the
//! boundary where a kind is interpreted, not throughout the core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminator for rows of the shared log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A user-authored message.
    User,
    /// An assistant-authored message.
    Assistant,
    /// A tool invocation.
    ToolCall,
    /// A tool invocation result.
    ToolResult,
    /// Context pushed from one agent to another.
    Injection,
    /// Persistent project knowledge.
    Knowledge,
    /// Connection markers and other bookkeeping rows.
    Resource,
    /// A request awaiting human approval. The only kind whose
    /// `metadata.status` mutates after insert (pending → approved|denied),
    /// and only by a human-facing collaborator outside this layer.
    ApprovalRequest,
}

impl EventKind {
    /// Stable string form used by stores and filters.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Injection => "injection",
            Self::Knowledge => "knowledge",
            Self::Resource => "resource",
            Self::ApprovalRequest => "approval_request",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool_call" => Ok(Self::ToolCall),
            "tool_result" => Ok(Self::ToolResult),
            "injection" => Ok(Self::Injection),
            "knowledge" => Ok(Self::Knowledge),
            "resource" => Ok(Self::Resource),
            "approval_request" => Ok(Self::ApprovalRequest),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized kind string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl std::fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

// ─────────────────────────────────────────────────────────────────────────────
// Event
// ─────────────────────────────────────────────────────────────────────────────

/// One immutable row of the shared log.
///
/// `ts` is an RFC 3339 instant assigned at insert; the store guarantees
/// per-insert monotone ordering on it and documents its own tie-break.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Globally unique, stable row id.
    pub id: String,
    /// Shared space the row belongs to.
    pub space_id: String,
    /// Authoring agent.
    pub agent_id: String,
    /// Authoring session.
    pub session_id: String,
    /// Row discriminator.
    pub kind: EventKind,
    /// Free-text content.
    pub content: String,
    /// Open metadata map. Interpret through the typed views.
    pub metadata: Value,
    /// RFC 3339 insert instant.
    pub ts: String,
}

impl Event {
    /// Interpret this row's metadata as an injection.
    #[must_use]
    pub fn injection_meta(&self) -> InjectionMeta {
        InjectionMeta::from_value(&self.metadata)
    }

    /// Interpret this row's metadata as a knowledge entry.
    #[must_use]
    pub fn knowledge_meta(&self) -> KnowledgeMeta {
        KnowledgeMeta::from_value(&self.metadata)
    }

    /// Interpret this row's metadata as an approval request.
    #[must_use]
    pub fn approval_meta(&self) -> ApprovalMeta {
        ApprovalMeta::from_value(&self.metadata)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Priority
// ─────────────────────────────────────────────────────────────────────────────

/// Injection priority. Unknown strings fall back to [`Priority::Normal`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Routine delivery.
    #[default]
    Normal,
    /// Worth attention soon.
    High,
    /// Act on this now.
    Urgent,
}

impl Priority {
    fn from_str_loose(s: &str) -> Self {
        match s {
            "urgent" => Self::Urgent,
            "high" => Self::High,
            _ => Self::Normal,
        }
    }

    /// Inline tag rendered after the sender name, empty for normal.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Urgent => " [URGENT]",
            Self::High => " [HIGH]",
            Self::Normal => "",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed metadata views
// ─────────────────────────────────────────────────────────────────────────────

fn meta_str(meta: &Value, key: &str) -> Option<String> {
    meta.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn meta_str_list(meta: &Value, key: &str) -> Vec<String> {
    meta.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Everything in `meta` except the listed known keys.
fn meta_extra(meta: &Value, known: &[&str]) -> Map<String, Value> {
    meta.as_object()
        .map(|m| {
            m.iter()
                .filter(|(k, _)| !known.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Metadata of an [`EventKind::Injection`] row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionMeta {
    /// Sending agent.
    #[serde(default)]
    pub from_agent: String,
    /// Addressee: an agent id, a user base name, or `"all"` for broadcast.
    #[serde(default)]
    pub target_agent: String,
    /// Delivery priority.
    #[serde(default)]
    pub priority: Priority,
    /// Optional short label set by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Unrecognized keys, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InjectionMeta {
    const KNOWN: &'static [&'static str] = &["fromAgent", "targetAgent", "priority", "label"];

    /// Field-wise extraction. A wrong-typed field defaults alone without
    /// discarding its siblings.
    #[must_use]
    pub fn from_value(meta: &Value) -> Self {
        Self {
            from_agent: meta_str(meta, "fromAgent").unwrap_or_default(),
            target_agent: meta_str(meta, "targetAgent").unwrap_or_default(),
            priority: meta
                .get("priority")
                .and_then(Value::as_str)
                .map(Priority::from_str_loose)
                .unwrap_or_default(),
            label: meta_str(meta, "label"),
            extra: meta_extra(meta, Self::KNOWN),
        }
    }
}

/// Metadata of an [`EventKind::Knowledge`] row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeMeta {
    /// Optional short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Categorization tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Agent that stored the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_by: Option<String>,
    /// Unrecognized keys, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgeMeta {
    const KNOWN: &'static [&'static str] = &["title", "tags", "storedBy"];

    /// Field-wise extraction with safe defaults.
    #[must_use]
    pub fn from_value(meta: &Value) -> Self {
        Self {
            title: meta_str(meta, "title"),
            tags: meta_str_list(meta, "tags"),
            stored_by: meta_str(meta, "storedBy"),
            extra: meta_extra(meta, Self::KNOWN),
        }
    }
}

/// Lifecycle state of an approval request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Granted.
    Approved,
    /// Rejected.
    Denied,
}

/// Metadata of an [`EventKind::ApprovalRequest`] row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalMeta {
    /// Current decision state.
    #[serde(default)]
    pub status: ApprovalStatus,
    /// Requesting agent.
    #[serde(default)]
    pub requested_by: String,
    /// Unrecognized keys, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApprovalMeta {
    const KNOWN: &'static [&'static str] = &["status", "requestedBy"];

    /// Field-wise extraction with safe defaults.
    #[must_use]
    pub fn from_value(meta: &Value) -> Self {
        let status = match meta.get("status").and_then(Value::as_str) {
            Some("approved") => ApprovalStatus::Approved,
            Some("denied") => ApprovalStatus::Denied,
            _ => ApprovalStatus::Pending,
        };
        Self {
            status,
            requested_by: meta_str(meta, "requestedBy").unwrap_or_default(),
            extra: meta_extra(meta, Self::KNOWN),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
