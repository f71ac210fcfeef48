//! User business logic service.
//!
//! Handles listing, lookup, creation, update and removal of managed users.

use crate::api::common::{PageInfo, UsersQuery, validation_message};
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::{UserListFilter, UserRepository};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use validator::Validate;

/// One page of users together with its pagination block.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub data: Vec<User>,
    pub pagination: PageInfo,
}

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists users with pagination, free-text search and gender filtering.
    pub async fn list_users(&self, query: &UsersQuery) -> ServiceResult<UserPage> {
        if let Err(validation_errors) = query.validate() {
            return Err(ServiceError::validation(validation_message(
                &validation_errors,
            )));
        }

        let page = query.page();
        let page_size = query.page_size();
        let filter = UserListFilter {
            search: query.search_term(),
            gender: query.gender,
        };

        let repo = UserRepository::new(self.pool);
        let offset = u64::from(page - 1) * u64::from(page_size);
        let data = repo.list_users(&filter, page_size, offset).await?;
        let total = repo.count_users(&filter).await?;

        Ok(UserPage {
            data,
            pagination: PageInfo::new(page, page_size, total),
        })
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if user doesn't exist
    pub async fn get_user_required(&self, id: i64) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;
        Ok(user)
    }

    /// Creates a new user with full validation.
    pub async fn create_user(&self, create_user: CreateUser) -> ServiceResult<User> {
        if let Err(validation_errors) = create_user.validate() {
            return Err(ServiceError::validation(validation_message(
                &validation_errors,
            )));
        }

        let repo = UserRepository::new(self.pool);
        let user = repo.create_user(&create_user).await?;
        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    /// Applies a partial update. An empty update returns the current record.
    pub async fn update_user(&self, id: i64, changes: UpdateUser) -> ServiceResult<User> {
        if let Err(validation_errors) = changes.validate() {
            return Err(ServiceError::validation(validation_message(
                &validation_errors,
            )));
        }

        if changes.is_empty() {
            return self.get_user_required(id).await;
        }

        let repo = UserRepository::new(self.pool);
        if !repo.update_user(id, &changes).await? {
            return Err(ServiceError::not_found("User", id.to_string()));
        }

        self.get_user_required(id).await
    }

    /// Deletes a user.
    pub async fn delete_user(&self, id: i64) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.delete_user(id).await? {
            return Err(ServiceError::not_found("User", id.to_string()));
        }

        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}
