//! Knowledge recall: surface stored project knowledge relevant to what a
//! session is working on.
//!
//! Candidates come from recent [`EventKind::Knowledge`] rows; ranking is
//! the lexical matcher in [`crate::relevance`]. Rows whose
//! `metadata.event` is `"destination"` are course data rendered elsewhere
//! and are skipped here.

use serde_json::Value;
use tracing::instrument;

use std::collections::HashMap;

use hive_core::context::SessionContext;
use hive_core::events::EventKind;
use hive_store::{EventQuery, Order, Store};

use crate::errors::Result;
use crate::relevance::{Candidate, RankOptions, RelevantEntry, milestones_to_query, rank};
use crate::settings::RelevanceSettings;

/// Rank the space's knowledge base against `query`.
#[instrument(skip(store, ctx, settings), fields(space_id = %ctx.space_id))]
pub async fn recall(
    store: &dyn Store,
    ctx: &SessionContext,
    query: &str,
    settings: &RelevanceSettings,
) -> Result<Vec<RelevantEntry>> {
    let rows = store
        .events(&EventQuery {
            space_id: ctx.space_id.clone(),
            kind: Some(EventKind::Knowledge),
            order: Order::Desc,
            limit: Some(settings.scan_limit),
            ..EventQuery::default()
        })
        .await?;

    let candidates: Vec<Candidate> = rows
        .iter()
        .filter(|row| row.metadata.get("event").and_then(Value::as_str) != Some("destination"))
        .map(|row| {
            let meta = row.knowledge_meta();
            Candidate {
                content: row.content.clone(),
                title: meta.title,
                tags: meta.tags,
                source: meta.stored_by.unwrap_or_else(|| row.agent_id.clone()),
            }
        })
        .collect();

    Ok(rank(
        query,
        &candidates,
        &RankOptions {
            top_n: settings.top_n,
            threshold: settings.threshold,
        },
    ))
}

/// Recall driven by a checklist: the not-yet-completed milestones become
/// the query. When everything is done there is nothing to look for, so no
/// store round-trip happens at all.
pub async fn recall_for_milestones(
    store: &dyn Store,
    ctx: &SessionContext,
    milestones: &[String],
    progress: &HashMap<String, bool>,
    settings: &RelevanceSettings,
) -> Result<Vec<RelevantEntry>> {
    let query = milestones_to_query(milestones, progress);
    if query.is_empty() {
        return Ok(Vec::new());
    }
    recall(store, ctx, &query, settings).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hive_store::{NewEvent, SqliteStore};

    fn ctx() -> SessionContext {
        SessionContext::new("space_1", "alpha-1", "alpha")
    }

    async fn learn(store: &SqliteStore, ctx: &SessionContext, content: &str, tags: &[&str]) {
        let _ = store
            .insert_event(NewEvent::knowledge(ctx, content, None, tags))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn recall_ranks_matching_knowledge() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        learn(&store, &ctx, "run the database migration script first", &[]).await;
        learn(&store, &ctx, "the deploy pipeline needs a green build", &[]).await;

        let results = recall(
            &store,
            &ctx,
            "database migration",
            &RelevanceSettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("database migration"));
        assert_eq!(results[0].source, "alpha-1");
    }

    #[tokio::test]
    async fn recall_matches_on_tags() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        learn(&store, &ctx, "always pin the schema version", &["migration"]).await;

        let results = recall(&store, &ctx, "migration", &RelevanceSettings::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn recall_skips_destination_rows() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        let mut dest = NewEvent::knowledge(&ctx, "migration milestone route", None, &[]);
        dest.metadata = serde_json::json!({"event": "destination"});
        let _ = store.insert_event(dest).await.unwrap();

        let results = recall(&store, &ctx, "migration", &RelevanceSettings::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn recall_empty_query_returns_nothing() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        learn(&store, &ctx, "anything at all", &[]).await;

        let results = recall(&store, &ctx, "the of", &RelevanceSettings::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn milestone_recall_uses_remaining_milestones() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        learn(&store, &ctx, "notes about the billing rollout", &[]).await;
        learn(&store, &ctx, "frontend styling conventions", &[]).await;

        let milestones = vec!["billing rollout".to_string(), "docs pass".to_string()];
        let progress = HashMap::from([("docs pass".to_string(), true)]);
        let results = recall_for_milestones(
            &store,
            &ctx,
            &milestones,
            &progress,
            &RelevanceSettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("billing"));
    }

    #[tokio::test]
    async fn milestone_recall_all_done_is_empty() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = ctx();
        learn(&store, &ctx, "anything", &[]).await;

        let milestones = vec!["A".to_string()];
        let progress = HashMap::from([("A".to_string(), true)]);
        let results = recall_for_milestones(
            &store,
            &ctx,
            &milestones,
            &progress,
            &RelevanceSettings::default(),
        )
        .await
        .unwrap();
        assert!(results.is_empty());
    }
}
