//! # hive-store
//!
//! The shared-log capability consumed by the Hive coordination layer.
//!
//! The coordination core never talks to a database directly; it consumes
//! the [`Store`] trait: filtered range queries, inserts, and counts over
//! the append-only event log, plus the secondary link relation used to
//! forward events between sessions. A production deployment points the
//! trait at whatever hosts the log; [`SqliteStore`] is the bundled
//! reference implementation and the test substrate.
//!
//! ## Crate Position
//!
//! Depends on `hive-core` for the event vocabulary. Depended on by
//! `hive-coord`.

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;

pub use errors::{Result, StoreError};
pub use sqlite::store::SqliteStore;
pub use store::Store;
pub use types::{EventQuery, Link, LinkKind, LinkQuery, NewEvent, NewLink, Order};
