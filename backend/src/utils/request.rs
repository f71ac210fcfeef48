//! Request inspection helpers: client identity and origin checks.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{
        HeaderMap,
        header::{ORIGIN, REFERER},
        request::Parts,
    },
};
use std::convert::Infallible;
use std::net::SocketAddr;
use url::Url;

use crate::errors::{ServiceError, ServiceResult};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity of the calling client, used to key rate limits.
///
/// First entry of `X-Forwarded-For`, else the peer address, else `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn from_parts(headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(client) = forwarded {
            return ClientId(client.to_string());
        }

        match remote {
            Some(addr) => ClientId(addr.ip().to_string()),
            None => ClientId("unknown".to_string()),
        }
    }
}

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientId::from_parts(&parts.headers, remote))
    }
}

/// Reduces a URL to `scheme://host[:port]`; unparsable input is kept as-is.
pub fn normalize_origin(value: &str) -> String {
    match Url::parse(value) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => value.to_string(),
    }
}

/// Origin of the request from `Origin`, falling back to `Referer`.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ORIGIN)
        .or_else(|| headers.get(REFERER))
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(normalize_origin)
}

/// Rejects requests whose origin is missing or differs from `expected`.
///
/// `expected` must already be normalized.
pub fn ensure_same_origin(headers: &HeaderMap, expected: &str) -> ServiceResult<()> {
    match request_origin(headers) {
        None => Err(ServiceError::forbidden("Missing origin")),
        Some(origin) if origin != expected => Err(ServiceError::forbidden("Invalid origin")),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_client_id_prefers_forwarded_for() {
        let remote: SocketAddr = "10.0.0.9:5555".parse().unwrap();

        let id = ClientId::from_parts(
            &headers(&[("x-forwarded-for", " 203.0.113.4 , 10.0.0.1")]),
            Some(remote),
        );
        assert_eq!(id, ClientId("203.0.113.4".to_string()));

        let id = ClientId::from_parts(&headers(&[("x-forwarded-for", "  ")]), Some(remote));
        assert_eq!(id, ClientId("10.0.0.9".to_string()));

        let id = ClientId::from_parts(&HeaderMap::new(), None);
        assert_eq!(id, ClientId("unknown".to_string()));
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(
            normalize_origin("http://localhost:4200/users?page=2"),
            "http://localhost:4200"
        );
        assert_eq!(normalize_origin("https://example.com:443/"), "https://example.com");
        assert_eq!(normalize_origin("not a url"), "not a url");
    }

    #[test]
    fn test_ensure_same_origin() {
        let expected = "http://localhost:4200";

        assert!(ensure_same_origin(&headers(&[("origin", "http://localhost:4200")]), expected).is_ok());
        assert!(
            ensure_same_origin(
                &headers(&[("referer", "http://localhost:4200/login")]),
                expected
            )
            .is_ok()
        );

        let missing = ensure_same_origin(&HeaderMap::new(), expected).unwrap_err();
        assert!(matches!(missing, ServiceError::Forbidden { ref message } if message == "Missing origin"));

        let wrong = ensure_same_origin(&headers(&[("origin", "http://evil.test")]), expected).unwrap_err();
        assert!(matches!(wrong, ServiceError::Forbidden { ref message } if message == "Invalid origin"));
    }
}
