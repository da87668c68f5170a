//! Global application error types and handlers.
//!
//! This module defines the error type shared by every service in the
//! backend and the helpers used to build it consistently.

use thiserror::Error;
use validator::ValidationErrors;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// The caller is signed in but has no delegated GitHub token.
    #[error("Account not linked: {message}")]
    AccountNotLinked { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("External service error: {message}")]
    ExternalService { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn account_not_linked(message: impl Into<String>) -> Self {
        Self::AccountNotLinked {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    /// Flattens `validator` output into a single `field: message` list.
    pub fn from_validation_errors(errors: &ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        messages.sort();

        Self::validation(messages.join(", "))
    }
}

/// Message used whenever a request arrives without a usable bearer token.
pub const MISSING_CREDENTIALS: &str = "Missing or invalid authorization token.";

/// Message used when the session carries no delegated GitHub token.
pub const GITHUB_NOT_LINKED: &str =
    "GitHub account not linked. Please link your GitHub account via the sidebar.";

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SignupForm {
        #[validate(email(message = "Must be a valid email"))]
        email: String,
    }

    #[test]
    fn test_validation_errors_flattened() {
        let form = SignupForm {
            email: "nope".to_string(),
        };
        let err = ServiceError::from_validation_errors(&form.validate().unwrap_err());
        assert_eq!(err.to_string(), "Validation error: email: Must be a valid email");
    }

    #[test]
    fn test_not_found_display() {
        let err = ServiceError::not_found("Team", "t1");
        assert_eq!(err.to_string(), "Team not found: t1");
    }

    #[test]
    fn test_anyhow_converts_to_database() {
        let err: ServiceError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, ServiceError::Database { .. }));
    }
}
