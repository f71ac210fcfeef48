//! Central module for organizing the application's API endpoints.
//!
//! Holds the users resource, service metadata endpoints and the API docs
//! mounted under the API base path. Session routes live in `crate::auth`.

pub mod common;
pub mod health;
pub mod openapi;
pub mod user;
