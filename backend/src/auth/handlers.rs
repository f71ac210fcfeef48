//! Handler functions for authentication-related API endpoints.
//!
//! Each handler runs its checks in a fixed order (origin, rate limit, cookie,
//! token work) and stops at the first failure, so a rejected request never
//! reaches credential or token processing.

use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::HeaderMap,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::api::common::{ApiError, service_error_to_http};
use crate::auth::AuthState;
use crate::auth::models::*;
use crate::auth::service::REFRESH_COOKIE_NAME;
use crate::errors::ServiceError;
use crate::utils::jwt::AccessClaims;
use crate::utils::request::{ClientId, ensure_same_origin};

/// Handle user login request
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued; refresh token set as an HttpOnly cookie", body = AccessTokenResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts from this client"),
    ),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn login(
    Extension(auth): Extension<Arc<AuthState>>,
    ClientId(client): ClientId,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AccessTokenResponse>), ApiError> {
    auth.rate_limiter
        .assert_within_limit(&format!("login:{}", client))
        .map_err(service_error_to_http)?;

    // Malformed bodies still count as attempts
    let Json(payload) = payload
        .map_err(|e| service_error_to_http(ServiceError::validation(e.body_text())))?;

    let user = auth
        .tokens
        .validate_credentials(&payload.email, &payload.password)
        .await
        .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Invalid credentials")))?;

    let access_token = auth
        .tokens
        .issue_access_token(&user)
        .map_err(service_error_to_http)?;
    let refresh_token = auth
        .tokens
        .issue_refresh_token(&user)
        .map_err(service_error_to_http)?;

    tracing::info!("User {} ({}) logged in", user.id, user.role);

    Ok((
        jar.add(auth.tokens.refresh_cookie(refresh_token)),
        Json(AccessTokenResponse { access_token }),
    ))
}

/// Handle token refresh request, rotating the refresh cookie
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token; refresh cookie rotated", body = AccessTokenResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token"),
        (status = 403, description = "Missing or foreign Origin/Referer"),
        (status = 429, description = "Too many refresh attempts from this client"),
    ),
    security(("refresh_cookie" = [])),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(auth): Extension<Arc<AuthState>>,
    ClientId(client): ClientId,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AccessTokenResponse>), ApiError> {
    ensure_same_origin(&headers, &auth.web_origin).map_err(service_error_to_http)?;

    auth.rate_limiter
        .assert_within_limit(&format!("refresh:{}", client))
        .map_err(service_error_to_http)?;

    let current = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Missing refresh token")))?;

    let (user, _) = auth
        .tokens
        .verify_refresh_token(&current, false)
        .await
        .map_err(service_error_to_http)?;

    let access_token = auth
        .tokens
        .issue_access_token(&user)
        .map_err(service_error_to_http)?;
    let next_refresh_token = auth
        .tokens
        .issue_refresh_token(&user)
        .map_err(service_error_to_http)?;

    Ok((
        jar.add(auth.tokens.refresh_cookie(next_refresh_token)),
        Json(AccessTokenResponse { access_token }),
    ))
}

/// Handle logout: revoke the caller's refresh tokens when identifiable and
/// always clear the cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = LogoutResponse),
        (status = 403, description = "Missing or foreign Origin/Referer"),
    ),
    security((), ("refresh_cookie" = [])),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn logout(
    Extension(auth): Extension<Arc<AuthState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), ApiError> {
    ensure_same_origin(&headers, &auth.web_origin).map_err(service_error_to_http)?;

    let current = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty());

    if let Some(token) = current {
        // Invalid tokens are ignored; logout still succeeds.
        match auth.tokens.verify_refresh_token(&token, true).await {
            Ok((_, claims)) => match auth.tokens.store().increment_token_version(claims.sub).await {
                Ok(Some(version)) => {
                    tracing::info!("User {} logged out (token version {})", claims.sub, version)
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to revoke sessions for {}: {}", claims.sub, e),
            },
            Err(e) => tracing::debug!("Ignoring refresh token on logout: {}", e),
        }
    }

    Ok((
        jar.add(auth.tokens.clear_refresh_cookie()),
        Json(LogoutResponse { logged_out: true }),
    ))
}

/// Return the authenticated identity
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Identity carried by the access token", body = AuthUserResponse),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn me(claims: AccessClaims) -> Json<AuthUserResponse> {
    Json(AuthUserResponse::from(claims))
}
