//! Module for core business logic services.
//!
//! Session and token logic lives in `crate::auth::service`; this module holds
//! the services behind the resource endpoints.

pub mod user_service;
