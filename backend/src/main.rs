//! Main entry point for the user management backend.
//!
//! This file initializes tracing, loads configuration, prepares the database
//! (migrations and seeding) and serves the Axum application with the access
//! guard in front of every route.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use crate::api::common::ApiResponse;
use crate::auth::AuthState;
use crate::auth::middleware::{AccessGuard, access_guard};
use crate::auth::rate_limit::RateLimiter;
use crate::auth::routes::{AUTH_PREFIX, PUBLIC_AUTH_PATHS, auth_router};
use crate::auth::service::TokenService;
use crate::repositories::auth_user_repository::AuthUserRepository;
use crate::utils::clock::SystemClock;
use anyhow::Context;
use axum::{Extension, Router, middleware, response::Json, routing::get};
use config::Config;
use database::Database;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    db.migrate().await?;
    let pool = db.pool().clone();

    let credentials = AuthUserRepository::new(pool.clone());
    database::seed::seed_admin_user(&credentials, &config.seed, bcrypt::DEFAULT_COST).await?;
    database::seed::seed_users(&pool, &config.seed).await?;

    let tokens = Arc::new(TokenService::new(Arc::new(credentials), &config));
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window_ms,
        Arc::new(SystemClock),
    );
    let auth = Arc::new(AuthState::new(tokens, rate_limiter, &config.web_origin));

    let app = build_app(pool, auth, &config);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!(
        "Starting server on port {} (API base {})",
        config.server_port,
        config.api_base_path()
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    db.close().await;
    Ok(())
}

/// Assembles the application router: session routes under `/auth`, resource
/// routes and docs under the API base path, and the access guard over all of
/// them.
pub fn build_app(pool: SqlitePool, auth: Arc<AuthState>, config: &Config) -> Router {
    let base = config.api_base_path();
    let health_path = format!("{}/health", base.trim_end_matches('/'));

    let guard = PUBLIC_AUTH_PATHS.iter().fold(
        AccessGuard::new(auth.tokens.clone(), &base)
            .allow_public("/")
            .allow_public(health_path),
        |guard, path| guard.allow_public(format!("{AUTH_PREFIX}{path}")),
    );

    let api = Router::new()
        .nest("/users", api::user::routes::user_router())
        .route("/health", get(api::health::health_handler));

    let app = Router::new()
        .route("/", get(root_handler))
        .nest(AUTH_PREFIX, auth_router());

    // axum refuses to nest at "/"
    let app = if base == "/" {
        app.merge(api)
    } else {
        app.nest(&base, api)
    };
    let app = app.merge(api::openapi::docs_router(&base));

    app.layer(middleware::from_fn_with_state(
        Arc::new(guard),
        access_guard,
    ))
    .layer(Extension(pool))
    .layer(Extension(auth))
    .layer(TraceLayer::new_for_http())
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "User Management API",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the User Management API",
    ))
}
