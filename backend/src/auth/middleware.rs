//! Access guard applied to the whole application router.
//!
//! Every request must carry a valid `Authorization: Bearer <access token>`
//! unless its path is registered as public or targets the API docs.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::common::{ApiError, service_error_to_http};
use crate::auth::service::TokenService;
use crate::errors::{ServiceError, ServiceResult};
use crate::utils::jwt::AccessClaims;

/// Path-based access policy backed by the access-token verifier.
pub struct AccessGuard {
    tokens: Arc<TokenService>,
    public_paths: HashSet<String>,
    docs_prefix: String,
}

impl AccessGuard {
    /// `base_path` is the API prefix (e.g. `/api/v1`) the docs live under.
    pub fn new(tokens: Arc<TokenService>, base_path: &str) -> Self {
        AccessGuard {
            tokens,
            public_paths: HashSet::new(),
            docs_prefix: format!("{}/docs", base_path.trim_end_matches('/')),
        }
    }

    /// Registers an exact path that needs no access token.
    pub fn allow_public(mut self, path: impl Into<String>) -> Self {
        self.public_paths.insert(path.into());
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.contains(path) || self.is_docs_request(path)
    }

    fn is_docs_request(&self, path: &str) -> bool {
        path == self.docs_prefix
            || path
                .strip_prefix(self.docs_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/') || rest == "-json")
    }

    /// Resolves the claims for a request, or `None` when the path is public.
    pub fn authorize(&self, path: &str, headers: &HeaderMap) -> ServiceResult<Option<AccessClaims>> {
        if self.is_public(path) {
            return Ok(None);
        }

        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::unauthorized("Unauthorized"))?;

        self.tokens.verify_access_token(token).map(Some)
    }
}

/// Middleware rejecting unauthenticated requests with 401 before routing.
///
/// Verified claims are stored in the request extensions for handlers.
pub async fn access_guard(
    State(guard): State<Arc<AccessGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    match guard.authorize(&path, request.headers()) {
        Ok(Some(claims)) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::debug!(path = %path, "Access denied: {}", e);
            service_error_to_http(e).into_response()
        }
    }
}

impl<S> FromRequestParts<S> for AccessClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Unauthorized")))
    }
}
