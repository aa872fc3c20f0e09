//! # hive-coord
//!
//! The agent coordination core: many autonomous sessions, no direct
//! channel between them, one shared append-only log. Agents only ever
//! pull, so every push-like behavior here is synthesized from repeated
//! polling plus per-session local state:
//!
//! - **[`inbox::InboxTracker`]**: converts polling into "what's new for
//!   me" notifications, exactly once per item per session, with bounded
//!   dedup memory
//! - **[`pressure::PressureMonitor`]**: approximates context exhaustion
//!   from a call counter and emits escalating checkpoint reminders
//! - **[`ratelimit::RateLimiter`]**: fixed-window request limiting per
//!   arbitrary key, shared across concurrent callers
//! - **[`relevance`]**: keyword-overlap ranking of free-text candidates,
//!   and [`knowledge::recall`] built on top of it
//! - **[`coordinator::Coordinator`]**: per-session composition root that
//!   piggybacks all of the above onto each unit of agent work
//! - **[`settings::CoordSettings`]**: layered configuration (defaults,
//!   JSON file, `HIVE_*` env)
//!
//! ## Crate Position
//!
//! Depends on `hive-core` and the `hive-store` capability. Presentation
//! layers render the plain text this crate produces.

#![deny(unsafe_code)]

pub mod coordinator;
pub mod errors;
pub mod inbox;
pub mod knowledge;
pub mod pressure;
pub mod ratelimit;
pub mod relevance;
pub mod settings;

pub use coordinator::Coordinator;
pub use errors::{CoordError, Result};
pub use inbox::InboxTracker;
pub use pressure::{ActionKind, PressureMonitor};
pub use ratelimit::{CapDecision, RateDecision, RateLimiter, cap_check};
pub use relevance::{Candidate, RankOptions, RelevantEntry, milestones_to_query, rank};
pub use settings::CoordSettings;
