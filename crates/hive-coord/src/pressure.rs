//! Context pressure monitoring.
//!
//! The coordination layer cannot see an agent's actual token usage, so
//! the count of calls since the last checkpoint stands in for it.
//! Thresholds are conservative. Advisories are piggybacked onto call
//! results by the [`Coordinator`](crate::coordinator::Coordinator); once
//! an agent has raised distress, nagging stops for the session.

/// Calls since last relief before the first reminder.
pub const WARN_AT: u64 = 30;
/// Calls since last relief before the "checkpoint now" reminder.
pub const URGENT_AT: u64 = 50;
/// Calls since last relief before the "raise distress" reminder.
pub const CRITICAL_AT: u64 = 70;

const WARN_TEXT: &str = "\n---\n\
CONTEXT PRESSURE: reminder (30+ calls since last checkpoint)\n\
Consider checkpointing to save your progress.\n\
---";

const URGENT_TEXT: &str = "\n---\n\
CONTEXT PRESSURE: HIGH (50+ calls since last checkpoint)\n\
Checkpoint your current task, progress, and remaining work.\n\
If you are nearly done, finish and mark the task done. Otherwise checkpoint now.\n\
---";

const CRITICAL_TEXT: &str = "\n---\n\
CONTEXT PRESSURE: CRITICAL (70+ calls since last checkpoint)\n\
Raise distress NOW. Your context window is likely near capacity.\n\
Hand off your current task state so another session can continue the work.\n\
---";

/// What a unit of agent work was, as far as pressure and piggybacking
/// are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Saved a checkpoint (relief).
    Checkpoint,
    /// Raised distress (relief, and latches the monitor off).
    Distress,
    /// Finished the task (relief).
    Done,
    /// Stopped work (relief).
    Stop,
    /// Recovered another session's state. Never nagged.
    Recover,
    /// Explicitly polled the inbox.
    CheckInbox,
    /// General activity worth an inbox delta.
    Activity,
    /// A network-facing call subject to rate limiting.
    NetworkCall,
    /// Anything else.
    Other,
}

impl ActionKind {
    /// Does this action reset the pressure counter?
    #[must_use]
    pub fn is_relief(self) -> bool {
        matches!(self, Self::Checkpoint | Self::Distress | Self::Done | Self::Stop)
    }

    /// Should this action never receive a reminder appended?
    #[must_use]
    pub fn skips_reminder(self) -> bool {
        self.is_relief() || self == Self::Recover
    }
}

/// Per-session pressure state machine.
///
/// Three pieces of state, two of them monotone: `last_relief_at` only
/// increases, and `distressed` never resets without a session restart.
#[derive(Clone, Debug, Default)]
pub struct PressureMonitor {
    call_count: u64,
    last_relief_at: u64,
    distressed: bool,
}

impl PressureMonitor {
    /// Create a fresh monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one unit of work. Returns advisory text to append, or `None`.
    ///
    /// Thresholds compare with `>=`, so a call landing exactly on a
    /// boundary fires that tier on that same call.
    pub fn tick(&mut self, action: ActionKind) -> Option<&'static str> {
        self.call_count += 1;

        if action.is_relief() {
            self.last_relief_at = self.call_count;
            if action == ActionKind::Distress {
                self.distressed = true;
            }
            return None;
        }

        if action.skips_reminder() {
            return None;
        }

        // Already distressed: the handoff is in flight, stop nagging.
        if self.distressed {
            return None;
        }

        let since_last = self.call_count - self.last_relief_at;
        if since_last >= CRITICAL_AT {
            Some(CRITICAL_TEXT)
        } else if since_last >= URGENT_AT {
            Some(URGENT_TEXT)
        } else if since_last >= WARN_AT {
            Some(WARN_TEXT)
        } else {
            None
        }
    }

    /// Total calls seen this session.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.call_count
    }

    /// Whether distress has been raised.
    #[must_use]
    pub fn is_distressed(&self) -> bool {
        self.distressed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
