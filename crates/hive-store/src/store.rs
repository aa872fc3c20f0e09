//! The [`Store`] capability trait.

use std::collections::HashMap;

use async_trait::async_trait;

use hive_core::events::Event;

use crate::errors::Result;
use crate::types::{EventQuery, Link, LinkQuery, NewEvent, NewLink};

/// Capability the coordination core consumes: filtered queries, inserts,
/// and counts over the shared append-only log.
///
/// Methods are async because a production store is network I/O; every
/// error is transient from the caller's point of view. Implementations
/// must order results by timestamp (with their own documented tie-break)
/// and must never mutate existing rows on behalf of this layer.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run a filtered range query over events.
    async fn events(&self, q: &EventQuery) -> Result<Vec<Event>>;

    /// Batch-resolve events by id.
    ///
    /// Returns a map of `id → Event`. Ids that match no row are silently
    /// omitted; callers degrade those to placeholders.
    async fn events_by_ids(&self, ids: &[String]) -> Result<HashMap<String, Event>>;

    /// Append one event. Returns the created row id.
    async fn insert_event(&self, event: NewEvent) -> Result<String>;

    /// Count events matching a query (ordering and limit are ignored).
    async fn count_events(&self, q: &EventQuery) -> Result<u64>;

    /// Run a filtered range query over links.
    async fn links(&self, q: &LinkQuery) -> Result<Vec<Link>>;

    /// Create one link. Returns the created row id.
    async fn insert_link(&self, link: NewLink) -> Result<String>;
}
