//! Event repository: filtered queries, batch lookup, insert, count.

use rusqlite::{Connection, Row, params};
use serde_json::Value;

use std::collections::HashMap;

use hive_core::events::{Event, EventKind};

use crate::errors::{Result, StoreError};
use crate::types::{EventQuery, NewEvent, Order};

/// Event repository.
pub struct EventRepo;

impl EventRepo {
    const COLUMNS: &'static str = "id, space_id, agent_id, session_id, kind, content, metadata, ts";

    /// Insert one event with a pre-assigned id and timestamp.
    pub fn insert(conn: &Connection, id: &str, ts: &str, event: &NewEvent) -> Result<()> {
        let metadata = event.metadata.to_string();
        let _ = conn.execute(
            "INSERT INTO events (id, space_id, agent_id, session_id, kind, content, metadata, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                event.space_id,
                event.agent_id,
                event.session_id,
                event.kind.as_str(),
                event.content,
                metadata,
                ts,
            ],
        )?;
        Ok(())
    }

    /// Run a filtered range query.
    ///
    /// Rows order by `ts` with `rowid` as the tie-break, so rows sharing an
    /// identical timestamp keep their insertion order.
    pub fn query(conn: &Connection, q: &EventQuery) -> Result<Vec<Event>> {
        use std::fmt::Write;

        let mut sql = format!(
            "SELECT {} FROM events WHERE space_id = ?1",
            Self::COLUMNS
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        values.push(Box::new(q.space_id.clone()));

        if let Some(kind) = q.kind {
            let _ = write!(sql, " AND kind = ?{}", values.len() + 1);
            values.push(Box::new(kind.as_str().to_string()));
        }
        if let Some(ref target) = q.target_agent {
            let _ = write!(
                sql,
                " AND json_extract(metadata, '$.targetAgent') = ?{}",
                values.len() + 1
            );
            values.push(Box::new(target.clone()));
        }
        if let Some(ref session) = q.session_id {
            let _ = write!(sql, " AND session_id = ?{}", values.len() + 1);
            values.push(Box::new(session.clone()));
        }
        if let Some(ref after) = q.after {
            let _ = write!(sql, " AND ts > ?{}", values.len() + 1);
            values.push(Box::new(after.clone()));
        }
        if let Some(ref needle) = q.content_like {
            let _ = write!(sql, " AND instr(content, ?{}) > 0", values.len() + 1);
            values.push(Box::new(needle.clone()));
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

    /// Batch-fetch events by id. Ids with no matching row are omitted.
    pub fn get_by_ids(conn: &Connection, ids: &[String]) -> Result<HashMap<String, Event>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT {} FROM events WHERE id IN ({})",
            Self::COLUMNS,
            placeholders.join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
        let rows = stmt.query_map(param_refs.as_slice(), Self::map_row)?;

        let mut map = HashMap::new();
        for row in rows {
            let event = row??;
            let _ = map.insert(event.id.clone(), event);
        }
        Ok(map)
    }

    /// Count rows matching the query's filters (order and limit ignored).
    pub fn count(conn: &Connection, q: &EventQuery) -> Result<u64> {
        use std::fmt::Write;

        let mut sql = String::from("SELECT COUNT(*) FROM events WHERE space_id = ?1");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        values.push(Box::new(q.space_id.clone()));

        if let Some(kind) = q.kind {
            let _ = write!(sql, " AND kind = ?{}", values.len() + 1);
            values.push(Box::new(kind.as_str().to_string()));
        }
        if let Some(ref session) = q.session_id {
            let _ = write!(sql, " AND session_id = ?{}", values.len() + 1);
            values.push(Box::new(session.clone()));
        }
        if let Some(ref after) = q.after {
            let _ = write!(sql, " AND ts > ?{}", values.len() + 1);
            values.push(Box::new(after.clone()));
        }

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(Box::as_ref).collect();
        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Map one row, parsing kind strictly and metadata leniently.
    ///
    /// A corrupt metadata blob degrades to `Value::Null` with a warning so
    /// one bad row cannot fail a whole poll; an unknown kind is a hard
    /// corrupt-row error because only this layer writes the column.
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Result<Event>> {
        let id: String = row.get(0)?;
        let kind_str: String = row.get(4)?;
        let metadata_str: String = row.get(6)?;

        let kind = match kind_str.parse::<EventKind>() {
            Ok(kind) => kind,
            Err(e) => {
                return Ok(Err(StoreError::Corrupt {
                    id,
                    reason: e.to_string(),
                }));
            }
        };
        let metadata = serde_json::from_str(&metadata_str).unwrap_or_else(|e| {
            tracing::warn!(event_id = %id, error = %e, "corrupt event metadata, defaulting to null");
            Value::Null
        });

        Ok(Ok(Event {
            id,
            space_id: row.get(1)?,
            agent_id: row.get(2)?,
            session_id: row.get(3)?,
            kind,
            content: row.get(5)?,
            metadata,
            ts: row.get(7)?,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::new_in_memory;
    use hive_core::context::SessionContext;
    use hive_core::events::Priority;

    fn ctx() -> SessionContext {
        SessionContext::new("space_1", "alpha", "alpha")
    }

    fn insert_at(conn: &Connection, id: &str, ts: &str, event: &NewEvent) {
        EventRepo::insert(conn, id, ts, event).unwrap();
    }

    #[test]
    fn insert_and_query_by_kind() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::injection(&ctx, "beta", "hi", Priority::Normal, None),
        );
        insert_at(
            &conn,
            "evt_2",
            "2026-08-07T00:00:02Z",
            &NewEvent::knowledge(&ctx, "fact", None, &[]),
        );

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                kind: Some(EventKind::Injection),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "evt_1");
    }

    #[test]
    fn query_filters_by_target_agent_metadata() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::injection(&ctx, "beta", "for beta", Priority::Normal, None),
        );
        insert_at(
            &conn,
            "evt_2",
            "2026-08-07T00:00:02Z",
            &NewEvent::injection(&ctx, "all", "for everyone", Priority::Normal, None),
        );

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                target_agent: Some("all".into()),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "evt_2");
    }

    #[test]
    fn query_after_is_strictly_greater() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::knowledge(&ctx, "old", None, &[]),
        );
        insert_at(
            &conn,
            "evt_2",
            "2026-08-07T00:00:02Z",
            &NewEvent::knowledge(&ctx, "new", None, &[]),
        );

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                after: Some("2026-08-07T00:00:01Z".into()),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "new");
    }

    #[test]
    fn query_desc_orders_newest_first() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::knowledge(&ctx, "first", None, &[]),
        );
        insert_at(
            &conn,
            "evt_2",
            "2026-08-07T00:00:02Z",
            &NewEvent::knowledge(&ctx, "second", None, &[]),
        );

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                order: Order::Desc,
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows[0].id, "evt_2");
        assert_eq!(rows[1].id, "evt_1");
    }

    #[test]
    fn identical_timestamps_tie_break_by_insertion() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        let ts = "2026-08-07T00:00:01Z";
        insert_at(&conn, "evt_a", ts, &NewEvent::knowledge(&ctx, "a", None, &[]));
        insert_at(&conn, "evt_b", ts, &NewEvent::knowledge(&ctx, "b", None, &[]));

        let asc = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(asc[0].id, "evt_a");
        assert_eq!(asc[1].id, "evt_b");

        let desc = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                order: Order::Desc,
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(desc[0].id, "evt_b");
    }

    #[test]
    fn query_limit_caps_rows() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        for i in 0..5 {
            insert_at(
                &conn,
                &format!("evt_{i}"),
                &format!("2026-08-07T00:00:0{i}Z"),
                &NewEvent::knowledge(&ctx, "row", None, &[]),
            );
        }

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                limit: Some(2),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn content_like_matches_substring() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::knowledge(&ctx, "run the database migration", None, &[]),
        );
        insert_at(
            &conn,
            "evt_2",
            "2026-08-07T00:00:02Z",
            &NewEvent::knowledge(&ctx, "unrelated", None, &[]),
        );

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                content_like: Some("migration".into()),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "evt_1");
    }

    #[test]
    fn get_by_ids_omits_missing() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::knowledge(&ctx, "present", None, &[]),
        );

        let map =
            EventRepo::get_by_ids(&conn, &["evt_1".to_string(), "evt_missing".to_string()])
                .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("evt_1"));
    }

    #[test]
    fn get_by_ids_empty_input() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let map = EventRepo::get_by_ids(&conn, &[]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn count_scopes_to_space() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let ctx = ctx();

        insert_at(
            &conn,
            "evt_1",
            "2026-08-07T00:00:01Z",
            &NewEvent::knowledge(&ctx, "a", None, &[]),
        );
        let mut other = NewEvent::knowledge(&ctx, "b", None, &[]);
        other.space_id = "space_2".into();
        insert_at(&conn, "evt_2", "2026-08-07T00:00:02Z", &other);

        let count = EventRepo::count(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn corrupt_metadata_defaults_to_null() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();

        let _ = conn
            .execute(
                "INSERT INTO events (id, space_id, agent_id, session_id, kind, content, metadata, ts)
                 VALUES ('evt_bad', 'space_1', 'alpha', 'sess_1', 'knowledge', 'c', '{oops', '2026-08-07T00:00:01Z')",
                [],
            )
            .unwrap();

        let rows = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                ..EventQuery::default()
            },
        )
        .unwrap();
        assert_eq!(rows[0].metadata, Value::Null);
    }

    #[test]
    fn unknown_kind_is_corrupt_row() {
        let pool = new_in_memory().unwrap();
        let conn = pool.get().unwrap();

        let _ = conn
            .execute(
                "INSERT INTO events (id, space_id, agent_id, session_id, kind, content, metadata, ts)
                 VALUES ('evt_bad', 'space_1', 'alpha', 'sess_1', 'telemetry', 'c', '{}', '2026-08-07T00:00:01Z')",
                [],
            )
            .unwrap();

        let err = EventRepo::query(
            &conn,
            &EventQuery {
                space_id: "space_1".into(),
                ..EventQuery::default()
            },
        )
        .unwrap_err();
        assert_matches::assert_matches!(err, StoreError::Corrupt { .. });
    }
}
