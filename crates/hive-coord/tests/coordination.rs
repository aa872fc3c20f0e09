//! End-to-end coordination flows against the bundled SQLite store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use hive_core::context::SessionContext;
use hive_core::events::{Event, Priority};
use hive_coord::pressure::ActionKind;
use hive_coord::settings::{CoordSettings, RelevanceSettings};
use hive_coord::{Coordinator, InboxTracker, RateLimiter, knowledge};
use hive_store::{
    EventQuery, Link, LinkKind, LinkQuery, NewEvent, NewLink, Result as StoreResult, SqliteStore,
    Store, StoreError,
};

fn session(space: &str, agent: &str, user: &str) -> SessionContext {
    SessionContext::new(space, agent, user)
}

/// Store stub whose every query fails, standing in for a network outage.
struct DownStore;

fn unreachable_store_error() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl Store for DownStore {
    async fn events(&self, _q: &EventQuery) -> StoreResult<Vec<Event>> {
        Err(unreachable_store_error())
    }

    async fn events_by_ids(&self, _ids: &[String]) -> StoreResult<HashMap<String, Event>> {
        Err(unreachable_store_error())
    }

    async fn insert_event(&self, _event: NewEvent) -> StoreResult<String> {
        Err(unreachable_store_error())
    }

    async fn count_events(&self, _q: &EventQuery) -> StoreResult<u64> {
        Err(unreachable_store_error())
    }

    async fn links(&self, _q: &LinkQuery) -> StoreResult<Vec<Link>> {
        Err(unreachable_store_error())
    }

    async fn insert_link(&self, _link: NewLink) -> StoreResult<String> {
        Err(unreachable_store_error())
    }
}

#[tokio::test]
async fn two_agents_exchange_injections_exactly_once() {
    hive_core::logging::init();
    let store = SqliteStore::in_memory().unwrap();
    let alpha = session("space_1", "alpha-1", "alpha");
    let beta = session("space_1", "beta-1", "beta");
    let limiter = Arc::new(RateLimiter::new());

    let mut alpha_coord = Coordinator::new(
        alpha.clone(),
        CoordSettings::default(),
        Arc::clone(&limiter),
    );
    let mut beta_coord =
        Coordinator::new(beta.clone(), CoordSettings::default(), Arc::clone(&limiter));

    // Baselines
    assert!(alpha_coord.annotate(&store, ActionKind::Activity).await.is_none());
    assert!(beta_coord.annotate(&store, ActionKind::Activity).await.is_none());

    // Beta messages alpha; alpha broadcasts
    let _ = store
        .insert_event(NewEvent::injection(
            &beta,
            "alpha-1",
            "the parser branch is yours",
            Priority::High,
            Some("handoff"),
        ))
        .await
        .unwrap();
    let _ = store
        .insert_event(NewEvent::injection(
            &alpha,
            "all",
            "deploy frozen until tomorrow",
            Priority::Urgent,
            None,
        ))
        .await
        .unwrap();

    // Alpha sees beta's message but not its own broadcast
    let alpha_delta = alpha_coord
        .annotate(&store, ActionKind::Activity)
        .await
        .expect("alpha should get a delta");
    assert!(alpha_delta.contains("From beta-1 [HIGH] (handoff):"));
    assert!(alpha_delta.contains("the parser branch is yours"));
    assert!(!alpha_delta.contains("deploy frozen"));

    // Beta sees alpha's broadcast
    let beta_delta = beta_coord
        .annotate(&store, ActionKind::Activity)
        .await
        .expect("beta should get a delta");
    assert!(beta_delta.contains("From alpha-1 [URGENT]:"));
    assert!(beta_delta.contains("deploy frozen"));

    // Nobody gets anything twice
    assert!(alpha_coord.annotate(&store, ActionKind::Activity).await.is_none());
    assert!(beta_coord.annotate(&store, ActionKind::Activity).await.is_none());
}

#[tokio::test]
async fn linked_context_arrives_alongside_injections() {
    let store = SqliteStore::in_memory().unwrap();
    let alpha = session("space_1", "alpha-1", "alpha");
    let gamma = session("space_1", "gamma-1", "gamma");

    let mut tracker = InboxTracker::default();
    let _ = tracker.check(&store, &alpha).await.unwrap();

    let source = store
        .insert_event(NewEvent::knowledge(
            &gamma,
            "auth tokens rotate every 24h, cache accordingly",
            Some("auth"),
            &["gotcha"],
        ))
        .await
        .unwrap();
    let _ = store
        .insert_link(NewLink {
            space_id: "space_1".into(),
            source_event_id: source,
            target_agent: "alpha".into(), // user-level targeting
            target_session_id: alpha.session_id.clone(),
            link_kind: LinkKind::Inject,
            created_by: "gamma-1".into(),
            label: Some("read before touching auth".into()),
        })
        .await
        .unwrap();
    let _ = store
        .insert_event(NewEvent::injection(
            &gamma,
            "alpha-1",
            "linked you the auth notes",
            Priority::Normal,
            None,
        ))
        .await
        .unwrap();

    let out = tracker.check(&store, &alpha).await.unwrap().unwrap();
    assert!(out.contains("INCOMING (1 new injection):"));
    assert!(out.contains("LINKED (1 inject-link):"));
    assert!(out.contains("Linked by gamma-1 (read before touching auth):"));
    assert!(out.contains("auth tokens rotate"));
}

#[tokio::test]
async fn store_outage_degrades_to_silence_not_failure() {
    let down = DownStore;
    let ctx = session("space_1", "alpha-1", "alpha");
    let mut coord = Coordinator::new(ctx, CoordSettings::default(), Arc::new(RateLimiter::new()));

    // The unit of work proceeds with no annotation, and pressure still ticks
    for _ in 0..5 {
        assert!(coord.annotate(&down, ActionKind::Activity).await.is_none());
    }
    assert_eq!(coord.pressure().calls(), 5);
}

#[tokio::test]
async fn tracker_surfaces_error_but_advances_cursor() {
    let down = DownStore;
    let healthy = SqliteStore::in_memory().unwrap();
    let alpha = session("space_1", "alpha-1", "alpha");

    let mut tracker = InboxTracker::default();
    assert!(tracker.check(&down, &alpha).await.is_err());

    // Recovery: the tracker keeps working against a healthy store
    let beta = session("space_1", "beta-1", "beta");
    let _ = healthy
        .insert_event(NewEvent::injection(
            &beta,
            "alpha-1",
            "back online",
            Priority::Normal,
            None,
        ))
        .await
        .unwrap();
    let out = tracker.check(&healthy, &alpha).await.unwrap().unwrap();
    assert!(out.contains("back online"));
}

#[tokio::test]
async fn knowledge_recall_supports_the_working_session() {
    let store = SqliteStore::in_memory().unwrap();
    let alpha = session("space_1", "alpha-1", "alpha");
    let beta = session("space_1", "beta-1", "beta");

    let _ = store
        .insert_event(NewEvent::knowledge(
            &beta,
            "database migrations must run inside a transaction",
            Some("migrations"),
            &["database", "gotcha"],
        ))
        .await
        .unwrap();
    let _ = store
        .insert_event(NewEvent::knowledge(
            &beta,
            "prefer feature flags for risky rollouts",
            None,
            &[],
        ))
        .await
        .unwrap();

    let results = knowledge::recall(
        &store,
        &alpha,
        "database migration",
        &RelevanceSettings::default(),
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].text.contains("transaction"));
    assert_eq!(results[0].source, "beta-1");
}

#[tokio::test]
async fn full_session_piggyback_flow() {
    let store = SqliteStore::in_memory().unwrap();
    let alpha = session("space_1", "alpha-1", "alpha");
    let beta = session("space_1", "beta-1", "beta");
    let mut coord = Coordinator::new(
        alpha,
        CoordSettings::default(),
        Arc::new(RateLimiter::new()),
    );

    // Work quietly for a while
    for _ in 0..10 {
        assert!(coord.annotate(&store, ActionKind::Other).await.is_none());
    }

    // A peer injects mid-session
    let _ = store
        .insert_event(NewEvent::injection(
            &beta,
            "alpha",
            "sync up before you merge",
            Priority::Normal,
            None,
        ))
        .await
        .unwrap();
    let out = coord.annotate(&store, ActionKind::Activity).await.unwrap();
    assert!(out.contains("sync up before you merge"));

    // Keep working until pressure warns (11 + 19 = 30 calls, no relief yet)
    let mut advisory = None;
    for _ in 0..19 {
        advisory = coord.annotate(&store, ActionKind::Other).await;
    }
    let advisory = advisory.expect("warn tier at 30 calls since start");
    assert!(advisory.contains("CONTEXT PRESSURE"));

    // Checkpoint clears the nagging
    assert!(coord.annotate(&store, ActionKind::Checkpoint).await.is_none());
    assert!(coord.annotate(&store, ActionKind::Other).await.is_none());
}
