//! Handler functions for the users resource.
//!
//! Request bodies and query strings are validated here so failures carry
//! per-field details; the service layer then applies the business rules.

use crate::api::common::{ApiError, ApiResponse, UsersQuery, service_error_to_http, validation_error_response};
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::services::user_service::{UserPage, UserService};
use crate::utils::jwt::AccessClaims;
use axum::{
    extract::{
        Extension, Json, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteUserResponse {
    pub deleted: bool,
}

/// Malformed bodies and query strings are reported as 400 like validation
/// failures.
fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message, "validation_error", None)),
    )
}

/// Lists users with pagination and optional search/gender filters.
#[utoipa::path(
    get,
    path = "/users",
    params(UsersQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 400, description = "Invalid query string"),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[axum::debug_handler]
pub async fn list_users(
    Extension(pool): Extension<SqlitePool>,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> Result<Json<UserPage>, ApiError> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    query
        .validate()
        .map_err(|e| validation_error_response(&e))?;

    let page = UserService::new(&pool)
        .list_users(&query)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(page))
}

/// Retrieves a user by its ID.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No user with this id"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[axum::debug_handler]
pub async fn get_user_by_id(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = UserService::new(&pool)
        .get_user_required(id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUser,
    responses(
        (status = 200, description = "The created user", body = User),
        (status = 400, description = "Malformed or invalid body"),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[axum::debug_handler]
pub async fn create_user(
    claims: AccessClaims,
    Extension(pool): Extension<SqlitePool>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = payload.map_err(|e| bad_request(e.body_text()))?;
    payload
        .validate()
        .map_err(|e| validation_error_response(&e))?;

    let user = UserService::new(&pool)
        .create_user(payload)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("User {} created by {}", user.id, claims.sub);
    Ok(Json(user))
}

/// Partially updates a user; an empty body returns the current record.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "The updated user", body = User),
        (status = 400, description = "Malformed or invalid body"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No user with this id"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[axum::debug_handler]
pub async fn update_user(
    claims: AccessClaims,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = payload.map_err(|e| bad_request(e.body_text()))?;
    payload
        .validate()
        .map_err(|e| validation_error_response(&e))?;

    let user = UserService::new(&pool)
        .update_user(id, payload)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("User {} updated by {}", id, claims.sub);
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed", body = DeleteUserResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No user with this id"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[axum::debug_handler]
pub async fn delete_user(
    claims: AccessClaims,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    UserService::new(&pool)
        .delete_user(id)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("User {} deleted by {}", id, claims.sub);
    Ok(Json(DeleteUserResponse { deleted: true }))
}
