//! Credential store interface consumed by the token service.

use crate::database::models::AuthUser;
use anyhow::Result;
use async_trait::async_trait;

/// Persisted identities with their token-version counter.
///
/// Emails passed in are already normalized (trimmed, lowercased).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthUser>>;

    /// Atomically increments the identity's token-version, invalidating every
    /// refresh token issued before the call. `None` if the identity is gone.
    async fn increment_token_version(&self, id: i64) -> Result<Option<i64>>;
}
