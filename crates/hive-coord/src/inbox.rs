//! Injection delivery synthesized from polling.
//!
//! An [`InboxTracker`] is owned by exactly one agent session and checked
//! on units of work. It polls the store for injections and inject-links
//! newer than its cursor, deduplicates against everything it has already
//! surfaced, and renders a human-readable delta to piggyback onto the
//! session's next result. Each item surfaces at most once per session for
//! the tracker's lifetime; the dedup set is bounded.
//!
//! The cursor advances before processing. A failure between advance and
//! render can therefore drop that poll window, which is accepted:
//! advancing afterwards would re-deliver the same window forever on a
//! persistent render failure.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use metrics::counter;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

use hive_core::context::SessionContext;
use hive_core::events::{Event, EventKind};
use hive_core::text::clip_with_ellipsis;
use hive_store::{EventQuery, Link, LinkKind, LinkQuery, Order, Store};

use crate::errors::Result;
use crate::settings::InboxSettings;

/// Hard bound on remembered surfaced ids.
const SURFACED_CAPACITY: usize = 200;

/// Structural prefix senders put on injection content, stripped on display.
static INJECT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[INJECT[^\]]*\]\s*(\([^)]*\)\s*)?:\s*").expect("static regex")
});

// ─────────────────────────────────────────────────────────────────────────────
// SurfacedSet
// ─────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered bounded set of surfaced ids.
///
/// When an insert pushes the set past its capacity, the oldest half is
/// evicted, keeping the most recent `capacity / 2` entries. Within its
/// window of memory an id is never surfaced twice; after eviction a very
/// old id could in principle re-surface, which the cursor makes
/// unreachable in practice (old rows no longer match `ts > since`).
#[derive(Clone, Debug)]
struct SurfacedSet {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SurfacedSet {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: String) {
        if self.ids.insert(id.clone()) {
            self.order.push_back(id);
        }
    }

    fn evict_to_capacity(&mut self) {
        if self.order.len() <= self.capacity {
            return;
        }
        let keep = self.capacity / 2;
        while self.order.len() > keep {
            if let Some(old) = self.order.pop_front() {
                let _ = self.ids.remove(&old);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InboxTracker
// ─────────────────────────────────────────────────────────────────────────────

/// Session-scoped tracker for pending injections.
pub struct InboxTracker {
    last_check: String,
    surfaced: SurfacedSet,
    settings: InboxSettings,
}

impl InboxTracker {
    /// Create a tracker whose cursor starts now: injections older than the
    /// session never surface.
    #[must_use]
    pub fn new(settings: InboxSettings) -> Self {
        Self {
            last_check: Utc::now().to_rfc3339(),
            surfaced: SurfacedSet::new(SURFACED_CAPACITY),
            settings,
        }
    }

    /// Number of ids currently remembered (observability, bounded).
    #[must_use]
    pub fn surfaced_count(&self) -> usize {
        self.surfaced.len()
    }

    /// Poll for injections and inject-links newer than the cursor and
    /// render the delta, or `None` when nothing new is pending.
    ///
    /// A store failure propagates to the caller, which must treat it the
    /// same as `None`; the cursor has already advanced by then.
    #[instrument(skip_all, fields(agent_id = %ctx.agent_id))]
    pub async fn check(
        &mut self,
        store: &dyn Store,
        ctx: &SessionContext,
    ) -> Result<Option<String>> {
        let since = std::mem::replace(&mut self.last_check, Utc::now().to_rfc3339());

        let fresh = self.fresh_injections(store, ctx, &since).await?;
        let linked = self.fresh_links(store, ctx, &since).await?;

        if fresh.is_empty() && linked.is_empty() {
            return Ok(None);
        }

        counter!("hive_inbox_surfaced_total").increment((fresh.len() + linked.len()) as u64);
        debug!(
            injections = fresh.len(),
            links = linked.len(),
            "surfacing inbox delta"
        );
        Ok(Some(self.render(&fresh, &linked)))
    }

    /// The three targeted queries, unioned, minus self-sent, minus
    /// already-surfaced. Survivors are recorded before returning.
    async fn fresh_injections(
        &mut self,
        store: &dyn Store,
        ctx: &SessionContext,
        since: &str,
    ) -> Result<Vec<Event>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut fresh: Vec<Event> = Vec::new();

        // An id may satisfy more than one filter (e.g. an agent targeted by
        // name whose user name matches too); the union dedups by id.
        for target in [ctx.agent_id.as_str(), ctx.user_id.as_str(), "all"] {
            let rows = store
                .events(&EventQuery {
                    space_id: ctx.space_id.clone(),
                    kind: Some(EventKind::Injection),
                    target_agent: Some(target.to_string()),
                    after: Some(since.to_string()),
                    order: Order::Desc,
                    limit: Some(self.settings.poll_limit),
                    ..EventQuery::default()
                })
                .await?;

            for event in rows {
                if event.injection_meta().from_agent == ctx.agent_id {
                    continue; // never surface self-sent injections
                }
                if seen.insert(event.id.clone()) && !self.surfaced.contains(&event.id) {
                    fresh.push(event);
                }
            }
        }

        for event in &fresh {
            self.surfaced.insert(event.id.clone());
        }
        self.surfaced.evict_to_capacity();
        Ok(fresh)
    }

    /// Inject-links addressed to self, with their source events resolved
    /// in one batch. A link whose source cannot be resolved keeps a `None`
    /// source and renders as a placeholder.
    async fn fresh_links(
        &mut self,
        store: &dyn Store,
        ctx: &SessionContext,
        since: &str,
    ) -> Result<Vec<(Link, Option<Event>)>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut links: Vec<Link> = Vec::new();

        for target in [ctx.agent_id.as_str(), ctx.user_id.as_str()] {
            let rows = store
                .links(&LinkQuery {
                    space_id: ctx.space_id.clone(),
                    link_kind: Some(LinkKind::Inject),
                    target_agent: Some(target.to_string()),
                    after: Some(since.to_string()),
                    order: Order::Desc,
                    limit: Some(self.settings.poll_limit),
                })
                .await?;

            for link in rows {
                if link.created_by == ctx.agent_id {
                    continue; // never surface self-created links
                }
                // Links dedup in their own key namespace: the prefix keeps
                // a link id from ever colliding with an event id.
                let dedup_key = format!("link:{}", link.id);
                if seen.insert(link.id.clone()) && !self.surfaced.contains(&dedup_key) {
                    self.surfaced.insert(dedup_key);
                    links.push(link);
                }
            }
        }
        self.surfaced.evict_to_capacity();

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let mut source_ids: Vec<String> =
            links.iter().map(|l| l.source_event_id.clone()).collect();
        source_ids.sort_unstable();
        source_ids.dedup();
        let mut sources = store.events_by_ids(&source_ids).await?;

        Ok(links
            .into_iter()
            .map(|link| {
                let source = sources.remove(&link.source_event_id);
                (link, source)
            })
            .collect())
    }

    /// Render the two-section block. Items keep the recency order the
    /// queries returned.
    fn render(&self, fresh: &[Event], linked: &[(Link, Option<Event>)]) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !fresh.is_empty() {
            let plural = if fresh.len() > 1 { "s" } else { "" };
            let mut lines = vec![format!(
                "\n---\nINCOMING ({} new injection{plural}):",
                fresh.len()
            )];
            for event in fresh {
                let meta = event.injection_meta();
                let label = meta
                    .label
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default();
                let content = INJECT_PREFIX.replace(&event.content, "");
                lines.push(format!(
                    "From {}{}{}:\n{}",
                    meta.from_agent,
                    meta.priority.tag(),
                    label,
                    clip_with_ellipsis(&content, self.settings.content_clip),
                ));
            }
            sections.push(lines.join("\n\n"));
        }

        if !linked.is_empty() {
            let plural = if linked.len() > 1 { "s" } else { "" };
            let mut lines = vec![format!(
                "\nLINKED ({} inject-link{plural}):",
                linked.len()
            )];
            for (link, source) in linked {
                let label = link
                    .label
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default();
                let content = source.as_ref().map_or_else(
                    || "(source event unavailable)".to_string(),
                    |event| clip_with_ellipsis(&event.content, self.settings.link_clip),
                );
                lines.push(format!("Linked by {}{}:\n{}", link.created_by, label, content));
            }
            sections.push(lines.join("\n\n"));
        }

        sections.join("\n")
    }
}

impl Default for InboxTracker {
    fn default() -> Self {
        Self::new(InboxSettings::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
