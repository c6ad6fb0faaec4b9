//! # Postgres
//!
//! This crate provides the PostgreSQL-backed known-availability store for the permit watcher.

/// Connection pool helpers and the known-state table.
pub mod database;
