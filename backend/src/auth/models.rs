//! Data structures for authentication requests and responses.
//!
//! Response bodies use camelCase field names to match the web client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::Role;
use crate::utils::jwt::AccessClaims;

/// Login request payload
///
/// Missing fields deserialize as empty strings and fail the credential check.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of a successful login or refresh; the refresh token only travels in
/// the cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Public fields of the authenticated identity
#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AuthUserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl From<AccessClaims> for AuthUserResponse {
    fn from(claims: AccessClaims) -> Self {
        AuthUserResponse {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}
