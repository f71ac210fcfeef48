//! Core business logic for the authentication system.
//!
//! `TokenService` verifies credentials, mints access and refresh tokens,
//! checks refresh tokens against the identity's current token-version and
//! builds the refresh cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::verify;
use std::sync::Arc;

use crate::auth::store::CredentialStore;
use crate::config::Config;
use crate::database::models::AuthUser;
use crate::errors::{ServiceError, ServiceResult};
use crate::utils::jwt::{AccessClaims, JwtUtils, RefreshClaims};

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Attributes applied to the refresh cookie
#[derive(Debug, Clone)]
pub struct RefreshCookiePolicy {
    pub path: String,
    pub secure: bool,
    pub max_age_ms: u64,
}

/// Token service for credential checks, token issuance and verification
pub struct TokenService {
    store: Arc<dyn CredentialStore>,
    access_jwt: JwtUtils,
    refresh_jwt: JwtUtils,
    access_expires_in_ms: u64,
    refresh_expires_in_ms: u64,
    cookie_policy: RefreshCookiePolicy,
}

impl TokenService {
    /// Create a new TokenService over the given credential store
    pub fn new(store: Arc<dyn CredentialStore>, config: &Config) -> Self {
        TokenService {
            store,
            access_jwt: JwtUtils::new(&config.jwt_access_secret),
            refresh_jwt: JwtUtils::new(&config.jwt_refresh_secret),
            access_expires_in_ms: config.access_expires_in_ms,
            refresh_expires_in_ms: config.refresh_expires_in_ms,
            cookie_policy: RefreshCookiePolicy {
                path: config.refresh_cookie_path.clone(),
                secure: config.is_production,
                max_age_ms: config.refresh_expires_in_ms,
            },
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Checks an email/password pair.
    ///
    /// Returns `None` for an unknown email, a wrong password, an unreadable
    /// hash or a store failure alike.
    pub async fn validate_credentials(&self, email: &str, password: &str) -> Option<AuthUser> {
        if email.is_empty() || password.is_empty() {
            return None;
        }

        let normalized_email = email.trim().to_lowercase();
        let user = match self.store.find_by_email(&normalized_email).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Credential lookup failed: {}", e);
                return None;
            }
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify(password, &hash)).await;

        match matches {
            Ok(Ok(true)) => Some(user),
            Ok(Ok(false)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Password verification failed for user {}: {}", user.id, e);
                None
            }
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                None
            }
        }
    }

    /// Signs `{sub, email, role}` with the access secret
    pub fn issue_access_token(&self, user: &AuthUser) -> ServiceResult<String> {
        let claims = AccessClaims::for_user(user, self.access_expires_in_ms);
        self.access_jwt.sign(&claims).map_err(|e| {
            ServiceError::internal_error(format!("Access token generation failed: {}", e))
        })
    }

    /// Signs `{sub, email, role, tokenVersion}` with the refresh secret
    pub fn issue_refresh_token(&self, user: &AuthUser) -> ServiceResult<String> {
        let claims = RefreshClaims::for_user(user, self.refresh_expires_in_ms);
        self.refresh_jwt.sign(&claims).map_err(|e| {
            ServiceError::internal_error(format!("Refresh token generation failed: {}", e))
        })
    }

    /// Validates signature and expiry of an access token. No store lookup.
    pub fn verify_access_token(&self, token: &str) -> ServiceResult<AccessClaims> {
        self.access_jwt
            .verify::<AccessClaims>(token, false)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                ServiceError::unauthorized("Unauthorized")
            })
    }

    /// Validates a refresh token and requires its token-version to match the
    /// identity's current one.
    ///
    /// `ignore_expiration` is only meant for logout, which needs the subject of
    /// an expired token to revoke its sessions.
    pub async fn verify_refresh_token(
        &self,
        token: &str,
        ignore_expiration: bool,
    ) -> ServiceResult<(AuthUser, RefreshClaims)> {
        let claims = self
            .refresh_jwt
            .verify::<RefreshClaims>(token, ignore_expiration)
            .map_err(|e| {
                tracing::debug!("Refresh token rejected: {}", e);
                ServiceError::unauthorized("Invalid refresh token")
            })?;

        let user = match self.store.find_by_id(claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(ServiceError::unauthorized("Invalid refresh token")),
            Err(e) => {
                tracing::error!("Identity lookup failed for refresh token: {}", e);
                return Err(ServiceError::unauthorized("Invalid refresh token"));
            }
        };

        if user.token_version != claims.token_version {
            tracing::info!(
                "Stale refresh token for user {} (version {} != {})",
                user.id,
                claims.token_version,
                user.token_version
            );
            return Err(ServiceError::unauthorized("Invalid refresh token"));
        }

        Ok((user, claims))
    }

    /// Cookie carrying a freshly issued refresh token
    pub fn refresh_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE_NAME, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_policy.secure)
            .path(self.cookie_policy.path.clone())
            .max_age(time::Duration::milliseconds(
                i64::try_from(self.cookie_policy.max_age_ms).unwrap_or(i64::MAX),
            ))
            .build()
    }

    /// Expired, empty cookie that removes the refresh token. Shares path and
    /// flags with `refresh_cookie` so browsers match it.
    pub fn clear_refresh_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((REFRESH_COOKIE_NAME, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_policy.secure)
            .path(self.cookie_policy.path.clone())
            .build();
        cookie.make_removal();
        cookie
    }
}
