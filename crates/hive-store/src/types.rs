//! Typed queries, inserts, and the link relation.
//!
//! Queries are option-structs with equality/range/pattern predicates only;
//! no store implementation is asked for joins, transactions, or schema
//! migration beyond its own.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use hive_core::context::SessionContext;
use hive_core::events::{EventKind, InjectionMeta, KnowledgeMeta, Priority};

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Result ordering on the timestamp column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Oldest first (natural log order).
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Filtered range query over events.
///
/// Every predicate is optional except the space scope. `after` compares
/// strictly greater on the RFC 3339 timestamp; `content_like` is substring
/// containment; `target_agent` matches `metadata.targetAgent`.
#[derive(Clone, Debug, Default)]
pub struct EventQuery {
    /// Space to search in.
    pub space_id: String,
    /// Filter by kind.
    pub kind: Option<EventKind>,
    /// Filter by `metadata.targetAgent`.
    pub target_agent: Option<String>,
    /// Filter by authoring session.
    pub session_id: Option<String>,
    /// Only rows strictly newer than this instant.
    pub after: Option<String>,
    /// Substring match on content.
    pub content_like: Option<String>,
    /// Result ordering.
    pub order: Order,
    /// Maximum rows returned.
    pub limit: Option<u32>,
}

/// Filtered range query over links.
#[derive(Clone, Debug, Default)]
pub struct LinkQuery {
    /// Space to search in.
    pub space_id: String,
    /// Filter by link kind.
    pub link_kind: Option<LinkKind>,
    /// Filter by addressee.
    pub target_agent: Option<String>,
    /// Only rows strictly newer than this instant.
    pub after: Option<String>,
    /// Result ordering.
    pub order: Order,
    /// Maximum rows returned.
    pub limit: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Links
// ─────────────────────────────────────────────────────────────────────────────

/// How a linked event relates to its target session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Read-only pointer.
    #[default]
    Reference,
    /// Push the source event into the target's inbox.
    Inject,
    /// Branch off from the source event.
    Fork,
}

impl LinkKind {
    /// Stable string form used by stores and filters.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Inject => "inject",
            Self::Fork => "fork",
        }
    }
}

impl std::str::FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Self::Reference),
            "inject" => Ok(Self::Inject),
            "fork" => Ok(Self::Fork),
            other => Err(format!("unknown link kind: {other}")),
        }
    }
}

/// One row of the link relation: a pointer from a source event to a
/// target agent/session, forwarding context without duplicating it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Globally unique link id.
    pub id: String,
    /// Space the link belongs to.
    pub space_id: String,
    /// Event being forwarded.
    pub source_event_id: String,
    /// Addressee: agent id or user base name.
    pub target_agent: String,
    /// Target session.
    pub target_session_id: String,
    /// Relation kind.
    pub link_kind: LinkKind,
    /// Agent that created the link.
    pub created_by: String,
    /// Optional short label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// RFC 3339 insert instant.
    pub ts: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Inserts
// ─────────────────────────────────────────────────────────────────────────────

/// An event to append. The store assigns `id` and `ts`.
#[derive(Clone, Debug)]
pub struct NewEvent {
    /// Space to append into.
    pub space_id: String,
    /// Authoring agent.
    pub agent_id: String,
    /// Authoring session.
    pub session_id: String,
    /// Row discriminator.
    pub kind: EventKind,
    /// Free-text content.
    pub content: String,
    /// Open metadata map.
    pub metadata: Value,
}

impl NewEvent {
    /// Build an injection addressed to `target` (an agent id, a user base
    /// name, or `"all"`). The content carries the structural
    /// `[INJECT -> …]:` prefix readers strip on display.
    #[must_use]
    pub fn injection(
        ctx: &SessionContext,
        target: &str,
        content: &str,
        priority: Priority,
        label: Option<&str>,
    ) -> Self {
        let label_part = label.map(|l| format!(" ({l})")).unwrap_or_default();
        let meta = InjectionMeta {
            from_agent: ctx.agent_id.clone(),
            target_agent: target.to_string(),
            priority,
            label: label.map(str::to_owned),
            extra: serde_json::Map::new(),
        };
        Self {
            space_id: ctx.space_id.clone(),
            agent_id: ctx.agent_id.clone(),
            session_id: ctx.session_id.clone(),
            kind: EventKind::Injection,
            content: format!("[INJECT -> {target}]{label_part}: {content}"),
            metadata: serde_json::to_value(meta).unwrap_or_else(|_| json!({})),
        }
    }

    /// Build a knowledge entry.
    #[must_use]
    pub fn knowledge(
        ctx: &SessionContext,
        content: &str,
        title: Option<&str>,
        tags: &[&str],
    ) -> Self {
        let meta = KnowledgeMeta {
            title: title.map(str::to_owned),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            stored_by: Some(ctx.agent_id.clone()),
            extra: serde_json::Map::new(),
        };
        Self {
            space_id: ctx.space_id.clone(),
            agent_id: ctx.agent_id.clone(),
            session_id: ctx.session_id.clone(),
            kind: EventKind::Knowledge,
            content: content.to_string(),
            metadata: serde_json::to_value(meta).unwrap_or_else(|_| json!({})),
        }
    }
}

/// A link to create. The store assigns `id` and `ts`.
#[derive(Clone, Debug)]
pub struct NewLink {
    /// Space to append into.
    pub space_id: String,
    /// Event being forwarded.
    pub source_event_id: String,
    /// Addressee.
    pub target_agent: String,
    /// Target session.
    pub target_session_id: String,
    /// Relation kind.
    pub link_kind: LinkKind,
    /// Creating agent.
    pub created_by: String,
    /// Optional short label.
    pub label: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SessionContext {
        SessionContext::new("space_1", "alpha-1f2e", "alpha")
    }

    #[test]
    fn injection_builder_sets_prefix_and_meta() {
        let ev = NewEvent::injection(&ctx(), "beta", "look at this", Priority::High, Some("hint"));
        assert_eq!(ev.kind, EventKind::Injection);
        assert_eq!(ev.content, "[INJECT -> beta] (hint): look at this");
        assert_eq!(ev.metadata["fromAgent"], "alpha-1f2e");
        assert_eq!(ev.metadata["targetAgent"], "beta");
        assert_eq!(ev.metadata["priority"], "high");
        assert_eq!(ev.metadata["label"], "hint");
    }

    #[test]
    fn injection_builder_without_label() {
        let ev = NewEvent::injection(&ctx(), "all", "broadcast", Priority::Normal, None);
        assert_eq!(ev.content, "[INJECT -> all]: broadcast");
        assert!(ev.metadata.get("label").is_none());
    }

    #[test]
    fn knowledge_builder_sets_meta() {
        let ev = NewEvent::knowledge(&ctx(), "retry with backoff", Some("http"), &["api", "gotcha"]);
        assert_eq!(ev.kind, EventKind::Knowledge);
        assert_eq!(ev.metadata["title"], "http");
        assert_eq!(ev.metadata["tags"][1], "gotcha");
        assert_eq!(ev.metadata["storedBy"], "alpha-1f2e");
    }

    #[test]
    fn link_kind_round_trips() {
        for kind in [LinkKind::Reference, LinkKind::Inject, LinkKind::Fork] {
            let parsed: LinkKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("push".parse::<LinkKind>().is_err());
    }

    #[test]
    fn default_query_is_unfiltered_asc() {
        let q = EventQuery::default();
        assert!(q.kind.is_none());
        assert_eq!(q.order, Order::Asc);
    }
}
