//! Schema for the `SQLite` store.
//!
//! Two tables: the append-only event log and the link relation. Both are
//! ordered by `ts` with `rowid` as the deterministic tie-break for rows
//! sharing an identical timestamp (insertion sequence).

use rusqlite::Connection;

use crate::errors::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    space_id    TEXT NOT NULL,
    agent_id    TEXT NOT NULL,
    session_id  TEXT NOT NULL,
    kind        TEXT NOT NULL,
    content     TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    ts          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_space_kind_ts
    ON events(space_id, kind, ts);
CREATE INDEX IF NOT EXISTS idx_events_space_session_ts
    ON events(space_id, session_id, ts);

CREATE TABLE IF NOT EXISTS links (
    id                 TEXT PRIMARY KEY,
    space_id           TEXT NOT NULL,
    source_event_id    TEXT NOT NULL,
    target_agent       TEXT NOT NULL,
    target_session_id  TEXT NOT NULL,
    link_kind          TEXT NOT NULL,
    created_by         TEXT NOT NULL,
    label              TEXT,
    ts                 TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_space_kind_target_ts
    ON links(space_id, link_kind, target_agent, ts);
";

/// Apply the schema. Idempotent; safe to run at every pool construction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
