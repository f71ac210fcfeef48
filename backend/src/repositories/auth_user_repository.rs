//! Database repository for authentication identities.
//!
//! Backs the credential store used by the token service: lookups by email
//! and id, creation for seeding, and the token-version bump that revokes
//! refresh tokens.

use crate::auth::store::CredentialStore;
use crate::database::models::{AuthUser, CreateAuthUser};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for `auth_users` operations.
///
/// Holds its own pool handle since it is shared process-wide behind
/// `Arc<dyn CredentialStore>`.
#[derive(Clone)]
pub struct AuthUserRepository {
    pool: SqlitePool,
}

impl AuthUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a credential record with token-version 0.
    ///
    /// The email is expected to be normalized already.
    pub async fn create_auth_user(&self, user: CreateAuthUser) -> Result<AuthUser> {
        let created = sqlx::query_as::<_, AuthUser>(
            r#"
            INSERT INTO auth_users (email, password_hash, role, token_version)
            VALUES (?, ?, ?, 0)
            RETURNING id, email, password_hash, role, token_version
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT id, email, password_hash, role, token_version
            FROM auth_users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT id, email, password_hash, role, token_version
            FROM auth_users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Bumps the token-version in a single statement so concurrent logouts
    /// each count exactly once.
    ///
    /// # Returns
    /// The new version, or `None` when the identity does not exist
    pub async fn bump_token_version(&self, id: i64) -> Result<Option<i64>> {
        let version = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE auth_users SET token_version = token_version + 1
            WHERE id = ?
            RETURNING token_version
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version)
    }
}

#[async_trait]
impl CredentialStore for AuthUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        self.get_by_email(email).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthUser>> {
        self.get_by_id(id).await
    }

    async fn increment_token_version(&self, id: i64) -> Result<Option<i64>> {
        self.bump_token_version(id).await
    }
}
