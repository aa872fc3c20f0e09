//! # hive-core
//!
//! Foundation types and utilities for the Hive agent coordination layer.
//!
//! This crate provides the shared vocabulary the other Hive crates depend on:
//!
//! - **Events**: [`events::Event`] rows of the shared log, the
//!   [`events::EventKind`] discriminator, and typed metadata views
//!   ([`events::InjectionMeta`], [`events::KnowledgeMeta`],
//!   [`events::ApprovalMeta`]) with safe defaulting
//! - **Session context**: [`context::SessionContext`] identifying one
//!   agent session inside a shared space
//! - **Text**: [`text::clip`] and [`text::clip_with_ellipsis`] for
//!   UTF-8-safe truncation of rendered notification blocks
//! - **Logging**: [`logging::init`] for the tracing subscriber
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `hive-store` and `hive-coord`.

#![deny(unsafe_code)]

pub mod context;
pub mod events;
pub mod logging;
pub mod text;
