//! Error handling utilities for API responses.
//!
//! Provides structured error responses and conversion between service-layer errors
//! and HTTP responses. Includes:
//! - Standard error response format
//! - ServiceError to HTTP status code mapping
//! - Validation error formatting helpers
//! - Pagination support for the users listing
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//! - `error.details`: Optional field-specific validation errors
//!
//! # Error Handling Flow
//! 1. Service layer returns domain-specific `ServiceError`
//! 2. `service_error_to_http` converts to appropriate HTTP response
//! 3. Validation errors are automatically formatted with field details

use crate::database::models::Gender;
use crate::errors::ServiceError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Standard API response wrapper, used here for error bodies and service
/// metadata endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Pagination block of a users listing
#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Current page number (1-indexed)
    pub page: u32,
    pub page_size: u32,
    /// Total number of matching items across all pages
    pub total: u64,
    /// Never less than 1, even for an empty result
    pub total_pages: u64,
}

/// Query string of `GET /users`
#[derive(Debug, Default, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    /// 1-indexed page number
    pub page: Option<u32>,
    /// Clamped to 1..=100
    pub page_size: Option<u32>,
    /// Case-insensitive match on name or country
    #[validate(length(max = 120, message = "Search term too long"))]
    pub search: Option<String>,
    pub gender: Option<Gender>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Implementation Details
// ============================================================================

impl PageInfo {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(page_size)).max(1);

        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

impl UsersQuery {
    /// Page number, at least 1
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
    }
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} {} not found", entity, identifier),
        ),
        ServiceError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        ServiceError::Forbidden { message } => (StatusCode::FORBIDDEN, "forbidden", message),
        ServiceError::RateLimited { message } => {
            (StatusCode::TOO_MANY_REQUESTS, "rate_limited", message)
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(ApiResponse::<()>::error(message, error_type, None)),
    )
}

/// Formats validator::ValidationErrors into field-specific error details
pub fn validation_errors_to_field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })
        })
        .collect()
}

/// Flattens validation errors into a single `field: message` line.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    validation_errors_to_field_errors(errors)
        .into_iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Helper to create validation error response
pub fn validation_error_response(errors: &validator::ValidationErrors) -> ApiError {
    let field_errors = validation_errors_to_field_errors(errors);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            "Validation failed",
            "validation_error",
            Some(field_errors),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_calculation() {
        let info = PageInfo::new(2, 10, 25);
        assert_eq!(info.total_pages, 3);

        let info = PageInfo::new(1, 10, 30);
        assert_eq!(info.total_pages, 3);

        // Empty result set still reports one page
        let info = PageInfo::new(1, 10, 0);
        assert_eq!(info.total_pages, 1);
    }

    #[test]
    fn test_page_info_wire_format() {
        let json = serde_json::to_value(PageInfo::new(1, 10, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 1, "pageSize": 10, "total": 3, "totalPages": 1})
        );
    }

    #[test]
    fn test_users_query_defaults_and_clamping() {
        let query = UsersQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.search_term(), None);

        let query = UsersQuery {
            page: Some(0),
            page_size: Some(0),
            search: Some("  Canada ".to_string()),
            gender: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 1);
        assert_eq!(query.search_term().as_deref(), Some("Canada"));

        let query = UsersQuery {
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ServiceError::forbidden("x"), StatusCode::FORBIDDEN),
            (ServiceError::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS),
            (ServiceError::not_found("User", "1"), StatusCode::NOT_FOUND),
            (ServiceError::validation("x"), StatusCode::BAD_REQUEST),
            (
                ServiceError::internal_error("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let (status, _) = service_error_to_http(error);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let (_, Json(body)) = service_error_to_http(ServiceError::from(anyhow::anyhow!(
            "UNIQUE constraint failed: auth_users.email"
        )));
        assert_eq!(body.message, "Internal server error");
    }
}
