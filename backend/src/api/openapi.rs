//! OpenAPI document and Swagger UI for the HTTP API.
//!
//! Session routes are documented at their absolute `/auth/*` paths; resource
//! routes are written relative to the API base and nested under it when the
//! document is built.

use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{Components, OpenApi as OpenApiDoc};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::common::PageInfo;
use crate::api::health::{self, HealthResponse};
use crate::api::user::handlers::{self as users, DeleteUserResponse};
use crate::auth::handlers as auth;
use crate::auth::models::{AccessTokenResponse, AuthUserResponse, LoginRequest, LogoutResponse};
use crate::auth::service::REFRESH_COOKIE_NAME;
use crate::database::models::{CreateUser, Gender, Role, UpdateUser, User};
use crate::services::user_service::UserPage;

#[derive(OpenApi)]
#[openapi(
    info(title = "User Management API"),
    paths(auth::login, auth::refresh_token, auth::logout, auth::me),
    components(schemas(
        LoginRequest,
        AccessTokenResponse,
        AuthUserResponse,
        LogoutResponse,
        Role
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sessions: login, refresh rotation, logout and identity"),
        (name = "users", description = "Managed user records"),
        (name = "health", description = "Liveness")
    )
)]
struct ApiDoc;

/// Routes mounted under the API base path.
#[derive(OpenApi)]
#[openapi(
    paths(
        users::list_users,
        users::get_user_by_id,
        users::create_user,
        users::update_user,
        users::delete_user,
        health::health_handler
    ),
    components(schemas(
        User,
        Gender,
        CreateUser,
        UpdateUser,
        UserPage,
        PageInfo,
        DeleteUserResponse,
        HealthResponse
    ))
)]
struct ResourceDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        let components = openapi.components.get_or_insert_with(Components::new);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "refresh_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(REFRESH_COOKIE_NAME))),
        );
    }
}

/// Full document with resource paths placed under `base`.
#[must_use]
pub fn openapi(base: &str) -> OpenApiDoc {
    // axum merges instead of nesting at "/", and so does the document
    if base == "/" {
        ApiDoc::openapi().merge_from(ResourceDoc::openapi())
    } else {
        ApiDoc::openapi().nest(base, ResourceDoc::openapi())
    }
}

/// Swagger UI at `{base}/docs` and the JSON document at `{base}/docs-json`.
pub fn docs_router(base: &str) -> Router {
    let prefix = base.trim_end_matches('/');
    SwaggerUi::new(format!("{prefix}/docs"))
        .url(format!("{prefix}/docs-json"), openapi(base))
        .into()
}
