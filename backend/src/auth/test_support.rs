//! Fixtures shared by the auth tests.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::AuthState;
use crate::auth::rate_limit::RateLimiter;
use crate::auth::service::TokenService;
use crate::config::Config;
use crate::database::models::{AuthUser, CreateAuthUser, Role};
use crate::database::test_pool;
use crate::repositories::auth_user_repository::AuthUserRepository;
use crate::utils::clock::ManualClock;

/// Token service over a fresh in-memory store, plus the repository behind it.
pub async fn test_token_service(config: &Config) -> (TokenService, AuthUserRepository) {
    let repo = AuthUserRepository::new(test_pool().await);
    let service = TokenService::new(Arc::new(repo.clone()), config);
    (service, repo)
}

/// Stores an identity with a low-cost bcrypt hash of `password`.
pub async fn seed_identity(
    repo: &AuthUserRepository,
    email: &str,
    password: &str,
    role: Role,
) -> AuthUser {
    let password_hash = bcrypt::hash(password, 4).unwrap();
    repo.create_auth_user(CreateAuthUser {
        email: email.to_string(),
        password_hash,
        role,
    })
    .await
    .unwrap()
}

/// A full application router wired like `main`, with a manual clock driving
/// the rate limiter.
pub struct TestApp {
    pub router: Router,
    pub repo: AuthUserRepository,
    pub clock: Arc<ManualClock>,
}

pub async fn test_app(config: &Config) -> TestApp {
    let pool = test_pool().await;
    let repo = AuthUserRepository::new(pool.clone());
    let tokens = Arc::new(TokenService::new(Arc::new(repo.clone()), config));
    let clock = Arc::new(ManualClock::starting_at(1_000_000));
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window_ms,
        clock.clone(),
    );
    let auth = Arc::new(AuthState::new(tokens, rate_limiter, &config.web_origin));

    TestApp {
        router: crate::build_app(pool, auth, config),
        repo,
        clock,
    }
}

/// Runs one request through the router; non-JSON bodies come back as `Null`.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs in and returns the access token together with the refresh cookie value.
pub async fn login(router: &Router, email: &str, password: &str) -> (String, String) {
    let body = serde_json::json!({ "email": email, "password": password });
    let (status, headers, body) =
        send(router, json_request("POST", "/auth/login", None, &body)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    let access_token = body["accessToken"].as_str().unwrap().to_string();
    let refresh_token = refresh_cookie(&headers).unwrap();
    (access_token, refresh_token)
}

/// Value of the `refresh_token` cookie set by a response, if any.
pub fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    set_cookie_header(headers).and_then(|cookie| {
        cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("refresh_token="))
            .map(str::to_string)
    })
}

/// Raw `Set-Cookie` header for the refresh cookie.
pub fn set_cookie_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh_token="))
        .map(str::to_string)
}
