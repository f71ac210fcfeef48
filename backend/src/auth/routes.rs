//! Defines the HTTP routes for session management.
//!
//! The router is nested under `/auth`, matching the refresh cookie path.

use crate::auth::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// Prefix the auth router is mounted at
pub const AUTH_PREFIX: &str = "/auth";

/// Routes reachable without an access token, relative to `AUTH_PREFIX`
pub const PUBLIC_AUTH_PATHS: [&str; 3] = ["/login", "/refresh", "/logout"];

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
