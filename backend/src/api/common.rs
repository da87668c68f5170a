//! Error handling utilities for API responses.
//!
//! Provides the JSON bodies shared by every endpoint and the conversion
//! between service-layer errors and HTTP responses.
//!
//! # Response Format
//! Successful function calls return `{ "message": ... }`. Errors return:
//! - `error`: Human-readable message
//! - `error_type`: Machine-readable error category
//!
//! Every failure is reported with a 4xx status and no internal detail.

use crate::errors::ServiceError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderName, Method, StatusCode},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Convert ServiceError to HTTP response
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::Authentication { message } => {
            (StatusCode::UNAUTHORIZED, "authentication_error", message)
        }
        ServiceError::PermissionDenied { message } => {
            (StatusCode::FORBIDDEN, "permission_denied", message)
        }
        ServiceError::AccountNotLinked { message } => {
            (StatusCode::FORBIDDEN, "account_not_linked", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::Conflict { message } => (StatusCode::CONFLICT, "conflict", message),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::BAD_REQUEST,
                "database_error",
                "The request could not be completed.".to_string(),
            )
        }
        ServiceError::ExternalService { message } => {
            (StatusCode::FAILED_DEPENDENCY, "upstream_error", message)
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            error_type: error_type.to_string(),
        }),
    )
}

/// Unwraps a JSON body, reporting malformed input as a validation error.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::validation(rejection.body_text()))
}

/// Answers bare `OPTIONS` requests that are not CORS preflights.
pub async fn preflight() -> &'static str {
    "ok"
}

/// Permissive CORS for the browser client, which runs on another origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static("content-type"),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (ServiceError::validation("x"), StatusCode::BAD_REQUEST),
            (ServiceError::authentication("x"), StatusCode::UNAUTHORIZED),
            (ServiceError::permission_denied("x"), StatusCode::FORBIDDEN),
            (ServiceError::account_not_linked("x"), StatusCode::FORBIDDEN),
            (ServiceError::not_found("Team", "t1"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("x"), StatusCode::CONFLICT),
            (
                ServiceError::external_service("x"),
                StatusCode::FAILED_DEPENDENCY,
            ),
        ];

        for (error, expected) in cases {
            let (status, _) = service_error_to_http(error);
            assert_eq!(status, expected);
            assert!(status.is_client_error());
        }
    }

    #[test]
    fn test_database_error_is_generic() {
        let (status, Json(body)) =
            service_error_to_http(anyhow::anyhow!("UNIQUE constraint failed: users.email").into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_type, "database_error");
        assert!(!body.error.contains("UNIQUE"));
    }
}
