//! JWT token utilities for authentication and authorization.
//!
//! Provides HS256 token signing/verification and the claim sets carried by
//! access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::database::models::{AuthUser, Role};

/// Claims carried by a short-lived access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Identity ID
    pub sub: i64,
    pub email: String,
    pub role: Role,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// Claims carried by a refresh token; adds the token-version snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshClaims {
    pub sub: i64,
    pub email: String,
    pub role: Role,
    #[serde(rename = "tokenVersion")]
    pub token_version: i64,
    pub exp: usize,
    pub iat: usize,
}

/// JWT token utility bound to a single HMAC secret
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expired_ok_validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance for the given secret
    pub fn new(secret: &str) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let mut expired_ok_validation = validation.clone();
        expired_ok_validation.validate_exp = false;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            expired_ok_validation,
        }
    }

    /// Sign a claim set
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding_key)
    }

    /// Validate and decode a token, optionally accepting an expired one
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        ignore_expiration: bool,
    ) -> Result<T, jsonwebtoken::errors::Error> {
        let validation = if ignore_expiration {
            &self.expired_ok_validation
        } else {
            &self.validation
        };

        decode::<T>(token, &self.decoding_key, validation).map(|token_data| token_data.claims)
    }
}

/// `(iat, exp)` pair for a token living `lifetime_ms` from now.
///
/// Lifetimes past chrono's range saturate at the latest representable instant.
fn issued_window(lifetime_ms: u64) -> (usize, usize) {
    let now = Utc::now();
    let exp = i64::try_from(lifetime_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (now.timestamp() as usize, exp.timestamp() as usize)
}

impl AccessClaims {
    pub fn for_user(user: &AuthUser, lifetime_ms: u64) -> Self {
        let (iat, exp) = issued_window(lifetime_ms);
        AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp,
            iat,
        }
    }
}

impl RefreshClaims {
    pub fn for_user(user: &AuthUser, lifetime_ms: u64) -> Self {
        let (iat, exp) = issued_window(lifetime_ms);
        RefreshClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            token_version: user.token_version,
            exp,
            iat,
        }
    }
}
