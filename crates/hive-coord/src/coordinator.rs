//! Per-session composition root.
//!
//! On every unit of agent work the [`Coordinator`] ticks the pressure
//! monitor, consults the rate limiter for network-facing calls, and asks
//! the inbox tracker for a delta on inbox checks and general activity.
//! Whatever came back non-null is concatenated for the caller to append
//! to the unit of work's result.
//!
//! Tracker and monitor state belong to exactly one session and are only
//! touched through `&mut self`; the caller upholds the one-executor-per-
//! session invariant (session-affinity routing). The rate limiter is the
//! one deliberately shared piece and is safe to share.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use hive_core::context::SessionContext;
use hive_store::Store;

use crate::inbox::InboxTracker;
use crate::pressure::{ActionKind, PressureMonitor};
use crate::ratelimit::RateLimiter;
use crate::settings::CoordSettings;

/// Coordination state for one agent session.
pub struct Coordinator {
    ctx: SessionContext,
    settings: CoordSettings,
    inbox: InboxTracker,
    pressure: PressureMonitor,
    limiter: Arc<RateLimiter>,
}

impl Coordinator {
    /// Create the coordinator for one session. The limiter is shared
    /// across every session of the process.
    #[must_use]
    pub fn new(ctx: SessionContext, settings: CoordSettings, limiter: Arc<RateLimiter>) -> Self {
        let inbox = InboxTracker::new(settings.inbox.clone());
        Self {
            ctx,
            settings,
            inbox,
            pressure: PressureMonitor::new(),
            limiter,
        }
    }

    /// Process one unit of agent work; returns text to append to its
    /// result, or `None` when every signal is quiet.
    ///
    /// A store failure during the inbox check is logged and treated as
    /// "no notification this cycle"; it never fails the unit of work.
    pub async fn annotate(&mut self, store: &dyn Store, action: ActionKind) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();

        if matches!(action, ActionKind::CheckInbox | ActionKind::Activity) {
            match self.inbox.check(store, &self.ctx).await {
                Ok(Some(delta)) => parts.push(delta),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, agent_id = %self.ctx.agent_id, "inbox check failed, skipping notifications this cycle");
                }
            }
        }

        if let Some(advisory) = self.pressure.tick(action) {
            parts.push(advisory.to_string());
        }

        if action == ActionKind::NetworkCall {
            let key = format!("{}:{}", self.ctx.space_id, self.ctx.agent_id);
            let decision = self.limiter.allow(
                &key,
                self.settings.rate.limit,
                Duration::from_millis(self.settings.rate.window_ms),
            );
            if !decision.allowed {
                let resets_in = decision
                    .reset_at
                    .saturating_duration_since(Instant::now())
                    .as_secs();
                parts.push(format!(
                    "\n---\nRATE LIMITED: request budget exhausted for this window (resets in ~{resets_in}s).\nSlow down or retry after the reset.\n---"
                ));
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// The session this coordinator belongs to.
    #[must_use]
    pub fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    /// Pressure state (observability).
    #[must_use]
    pub fn pressure(&self) -> &PressureMonitor {
        &self.pressure
    }

    /// Inbox tracker (observability).
    #[must_use]
    pub fn inbox(&self) -> &InboxTracker {
        &self.inbox
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
