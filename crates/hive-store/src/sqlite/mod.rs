//! `SQLite` reference implementation of the store capability.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod store;
