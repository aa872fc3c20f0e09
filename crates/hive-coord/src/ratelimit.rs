//! Fixed-window rate limiting and the store-backed cap gate.
//!
//! This is a fixed-window counter, not a true sliding window: traffic
//! straddling a window boundary is under-limited and bursts concentrated
//! at a boundary are over-limited. That tradeoff buys O(1) memory and CPU
//! per check; callers needing strict limiting must combine this with
//! external durable storage. State is memory-resident and resets with the
//! process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use metrics::counter;
use parking_lot::Mutex;

use hive_store::{EventQuery, Store};

use crate::errors::Result;

/// How often expired windows are swept, at most.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of one [`RateLimiter::allow`] check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request fits the window.
    pub allowed: bool,
    /// Requests left in the window after this one.
    pub remaining: u32,
    /// When the window rolls over.
    pub reset_at: Instant,
}

#[derive(Clone, Copy, Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counter, shared across all callers of one process.
///
/// The window map is guarded by a single mutex so the read-modify-write on
/// an entry is atomic per key; concurrent callers on the same key never
/// lose increments. Construct one per process and hand out references
/// (never a module-level global).
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    last_cleanup: Mutex<Instant>,
    cleanup_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with the default 60 s cleanup cadence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cleanup_interval(CLEANUP_INTERVAL)
    }

    /// Create a limiter with a custom cleanup cadence (tests).
    #[must_use]
    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            last_cleanup: Mutex::new(Instant::now()),
            cleanup_interval,
        }
    }

    /// Check whether a request under `key` fits `limit` per `window`.
    ///
    /// An absent or expired window is replaced, never carried over. The
    /// caller decides what a denied decision means (reject, queue,
    /// degrade).
    pub fn allow(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        self.maybe_cleanup(&mut windows, now);

        let win = windows
            .entry(key.to_string())
            .and_modify(|w| {
                if now > w.reset_at {
                    *w = Window {
                        count: 0,
                        reset_at: now + window,
                    };
                }
            })
            .or_insert(Window {
                count: 0,
                reset_at: now + window,
            });

        win.count += 1;
        let allowed = win.count <= limit;
        let remaining = limit.saturating_sub(win.count);
        let reset_at = win.reset_at;
        drop(windows);

        if !allowed {
            counter!("hive_rate_limited_total").increment(1);
        }
        RateDecision {
            allowed,
            remaining,
            reset_at,
        }
    }

    /// Number of live windows (observability).
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.lock().len()
    }

    /// Sweep expired windows, at most once per cleanup interval, so total
    /// memory stays bounded by active keys.
    fn maybe_cleanup(&self, windows: &mut HashMap<String, Window>, now: Instant) {
        let mut last = self.last_cleanup.lock();
        if now.duration_since(*last) < self.cleanup_interval {
            return;
        }
        *last = now;
        windows.retain(|_, w| now <= w.reset_at);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`cap_check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapDecision {
    /// Whether the space is still under its cap.
    pub allowed: bool,
    /// Current row count.
    pub current: u64,
}

/// One-shot gate: is the space's event count still under `cap`?
///
/// A single count query against the store; no window, no internal state.
pub async fn cap_check(store: &dyn Store, space_id: &str, cap: u64) -> Result<CapDecision> {
    let current = store
        .count_events(&EventQuery {
            space_id: space_id.to_string(),
            ..EventQuery::default()
        })
        .await?;
    Ok(CapDecision {
        allowed: current < cap,
        current,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
