//! Database access layer.
//!
//! One repository per table, each issuing plain `sqlx` queries against the
//! shared SQLite pool.

pub mod auth_user_repository;
pub mod user_repository;
