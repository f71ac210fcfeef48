//! Defines the HTTP routes for the users resource.

use super::handlers::{create_user, delete_user, get_user_by_id, list_users, update_user};
use axum::{Router, routing::get};

pub fn user_router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
}
