//! Authentication module for sessions and access control.
//!
//! This module provides login, token refresh with rotation, logout with
//! server-side revocation, the "who am I" endpoint and the access guard
//! protecting every other route.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::service::TokenService;
use crate::utils::request::normalize_origin;

/// Components shared by the session endpoints.
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub rate_limiter: RateLimiter,
    /// Normalized origin that refresh and logout must come from
    pub web_origin: String,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenService>, rate_limiter: RateLimiter, web_origin: &str) -> Self {
        AuthState {
            tokens,
            rate_limiter,
            web_origin: normalize_origin(web_origin),
        }
    }
}
