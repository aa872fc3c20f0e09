//! [`SqliteStore`]: the bundled [`Store`] implementation.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use hive_core::events::Event;

use crate::errors::Result;
use crate::sqlite::connection::{self, ConnectionPool, PooledConnection};
use crate::sqlite::repositories::event::EventRepo;
use crate::sqlite::repositories::link::LinkRepo;
use crate::store::Store;
use crate::types::{EventQuery, Link, LinkQuery, NewEvent, NewLink};

/// Store backed by a pooled `SQLite` database.
///
/// Ids are `evt_`/`lnk_` prefixed UUID v7; timestamps are RFC 3339 taken
/// at insert. Rows sharing an identical timestamp order by `rowid`
/// (insertion sequence), which is this store's documented tie-break.
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open a store at `path`, creating the schema if missing.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            pool: connection::open(path)?,
        })
    }

    /// Open an in-memory store (tests, demos).
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: connection::new_in_memory()?,
        })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

#[async_trait]
impl Store for SqliteStore {
    #[instrument(skip(self, q), fields(space_id = %q.space_id))]
    async fn events(&self, q: &EventQuery) -> Result<Vec<Event>> {
        let conn = self.conn()?;
        EventRepo::query(&conn, q)
    }

    async fn events_by_ids(&self, ids: &[String]) -> Result<HashMap<String, Event>> {
        let conn = self.conn()?;
        EventRepo::get_by_ids(&conn, ids)
    }

    #[instrument(skip(self, event), fields(kind = %event.kind))]
    async fn insert_event(&self, event: NewEvent) -> Result<String> {
        let id = format!("evt_{}", Uuid::now_v7());
        let ts = chrono::Utc::now().to_rfc3339();
        let conn = self.conn()?;
        EventRepo::insert(&conn, &id, &ts, &event)?;
        debug!(event_id = %id, "event appended");
        Ok(id)
    }

    async fn count_events(&self, q: &EventQuery) -> Result<u64> {
        let conn = self.conn()?;
        EventRepo::count(&conn, q)
    }

    async fn links(&self, q: &LinkQuery) -> Result<Vec<Link>> {
        let conn = self.conn()?;
        LinkRepo::query(&conn, q)
    }

    #[instrument(skip(self, link), fields(kind = %link.link_kind.as_str()))]
    async fn insert_link(&self, link: NewLink) -> Result<String> {
        let id = format!("lnk_{}", Uuid::now_v7());
        let ts = chrono::Utc::now().to_rfc3339();
        let conn = self.conn()?;
        LinkRepo::insert(&conn, &id, &ts, &link)?;
        debug!(link_id = %id, "link created");
        Ok(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
