//! Module for the managed users resource.
//!
//! Exposes listing, lookup, creation, update and removal of user records.
//! Every route sits behind the access guard.

pub mod handlers;
pub mod routes;
