//! Link repository: filtered queries and insert.

use rusqlite::{Connection, Row, params};

use crate::errors::{Result, StoreError};
use crate::types::{Link, LinkKind, LinkQuery, NewLink, Order};

/// Link repository.
pub struct LinkRepo;

impl LinkRepo {
    const COLUMNS: &'static str =
        "id, space_id, source_event_id, target_agent, target_session_id, link_kind, created_by, label, ts";

    /// Insert one link with a pre-assigned id and timestamp.
    pub fn insert(conn: &Connection, id: &str, ts: &str, link: &NewLink) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO links (id, space_id, source_event_id, target_agent, target_session_id,
                                link_kind, created_by, label, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                link.space_id,
                link.source_event_id,
                link.target_agent,
                link.target_session_id,
                link.link_kind.as_str(),
                link.created_by,
                link.label,
                ts,
            ],
        )?;
        Ok(())
    }

    /// Run a filtered range query. Same ordering contract as events:
    /// `ts` with `rowid` tie-break.
    pub fn query(conn: &Connection, q: &LinkQuery) -> Result<Vec<Link>> {
        use std::fmt::Write;

        let mut sql = format!("SELECT {} FROM links WHERE space_id = ?1", Self::COLUMNS);
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        values.push(Box::new(q.space_id.clone()));

        if let Some(kind) = q.link_kind {
            let _ = write!(sql, " AND link_kind = ?{}", values.len() + 1);
            values.push(Box::new(kind.as_str().to_string()));
        }
        if let Some(ref target) = q.target_agent {
            let _ = write!(sql, " AND target_agent = ?{}", values.len() + 1);
            values.push(Box::new(target.clone()));
        }
        if let Some(ref after) = q.after {
            let _ = write!(sql, " AND ts > ?{}", values.len() + 1);
            values.push(Box::new(after.clone()));
        }

        sql.push_str(match q.order {
            Order::Asc => " ORDER BY ts ASC, rowid ASC",
            Order::Desc => " ORDER BY ts DESC, rowid DESC",
        });
        if let Some(limit) = q.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(Box::as_ref).collect();
        let rows = stmt.query_map(param_refs.as_slice(), Self::map_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .collect()
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Result<Link>> {
        let id: String = row.get(0)?;
        let kind_str: String = row.get(5)?;
        let link_kind = match kind_str.parse::<LinkKind>() {
            Ok(kind) => kind,
            Err(reason) => return Ok(Err(StoreError::Corrupt { id, reason })),
        };
        Ok(Ok(Link {
            id,
            space_id: row.get(1)?,
            source_event_id: row.get(2)?,
            target_agent: row.get(3)?,
            target_session_id: row.get(4)?,
            link_kind,
            created_by: row.get(6)?,
            label: row.get(7)?,
            ts: row.get(8)?,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
