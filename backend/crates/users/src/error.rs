//! Users Error Types
//!
//! This module provides users-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::convert::Infallible;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{
    app_error::{AppError, FieldErrors},
    kind::ErrorKind,
};
use kernel::validation::{ConfigurationError, UniqueError};
use platform::jwt::JwtError;
use platform::password::PasswordHashError;
use thiserror::Error;

/// Users-specific result type alias
pub type UserResult<T> = Result<T, UserError>;

/// Users-specific error variants
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Certificate not found")]
    CertificateNotFound,

    /// Unknown login or wrong password
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    /// Field-level input errors, duplicates included
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    /// Uniqueness constraint wired up wrong
    #[error("Validator configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordHashError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    /// Single-field validation error
    pub fn field(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(path, message);
        UserError::Validation(errors)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::UserNotFound | UserError::CertificateNotFound => StatusCode::NOT_FOUND,
            UserError::InvalidCredentials
            | UserError::MissingToken
            | UserError::InvalidToken
            | UserError::TokenExpired => StatusCode::UNAUTHORIZED,
            UserError::AccountDisabled => StatusCode::FORBIDDEN,
            UserError::Validation(_) => StatusCode::BAD_REQUEST,
            UserError::Database(sqlx::Error::PoolTimedOut) => StatusCode::SERVICE_UNAVAILABLE,
            UserError::Configuration(_)
            | UserError::Password(_)
            | UserError::Database(_)
            | UserError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::UserNotFound | UserError::CertificateNotFound => ErrorKind::NotFound,
            UserError::InvalidCredentials
            | UserError::MissingToken
            | UserError::InvalidToken
            | UserError::TokenExpired => ErrorKind::Unauthorized,
            UserError::AccountDisabled => ErrorKind::Forbidden,
            UserError::Validation(_) => ErrorKind::ValidationFailed,
            UserError::Database(sqlx::Error::PoolTimedOut) => ErrorKind::ServiceUnavailable,
            UserError::Configuration(_)
            | UserError::Password(_)
            | UserError::Database(_)
            | UserError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures get a generic message; details stay in the log.
    pub fn into_app_error(self) -> AppError {
        match self {
            UserError::Validation(errors) => AppError::validation(errors),
            UserError::Database(e) => AppError::from(e),
            UserError::Configuration(_) | UserError::Password(_) | UserError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            UserError::MissingToken => AppError::new(self.kind(), self.to_string())
                .with_action("Send 'Authorization: Bearer <token>' from /user/login"),
            UserError::TokenExpired => AppError::new(self.kind(), self.to_string())
                .with_action("Log in again"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            UserError::Database(e) => {
                tracing::error!(error = %e, "Users database error");
            }
            UserError::Configuration(e) => {
                tracing::error!(error = %e, "Uniqueness validator misconfigured");
            }
            UserError::Password(e) => {
                tracing::error!(error = %e, "Password hashing failed");
            }
            UserError::Internal(msg) => {
                tracing::error!(message = %msg, "Users internal error");
            }
            UserError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            UserError::AccountDisabled => {
                tracing::warn!("Login attempt on disabled account");
            }
            UserError::InvalidToken => {
                tracing::warn!("Rejected invalid bearer token");
            }
            _ => {
                tracing::debug!(error = %self, "Users error");
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl<E> From<UniqueError<E>> for UserError
where
    E: std::error::Error + Into<UserError> + 'static,
{
    fn from(err: UniqueError<E>) -> Self {
        match err {
            UniqueError::Configuration(e) => UserError::Configuration(e),
            UniqueError::Storage(e) => e.into(),
        }
    }
}

impl From<Infallible> for UserError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

impl From<JwtError> for UserError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => UserError::TokenExpired,
            JwtError::Invalid => UserError::InvalidToken,
            JwtError::Encoding(msg) => UserError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(UserError::InvalidCredentials.status_code(), 401);
        assert_eq!(UserError::AccountDisabled.status_code(), 403);
        assert_eq!(UserError::CertificateNotFound.status_code(), 404);
        assert_eq!(UserError::field("email", "x").status_code(), 400);
        assert_eq!(
            UserError::Configuration(ConfigurationError::EmptyFieldSet).status_code(),
            500
        );
    }

    #[test]
    fn test_kind_matches_status() {
        for err in [
            UserError::UserNotFound,
            UserError::InvalidCredentials,
            UserError::AccountDisabled,
            UserError::MissingToken,
            UserError::Internal("x".to_string()),
        ] {
            assert_eq!(err.kind().status_code(), err.status_code().as_u16());
        }
    }

    #[test]
    fn test_validation_keeps_field_errors() {
        let app = UserError::field("email", "This value is already used.").into_app_error();
        assert_eq!(app.kind(), ErrorKind::ValidationFailed);
        assert_eq!(
            app.field_errors().unwrap().get("email"),
            Some("This value is already used.")
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let app = UserError::Internal("pool poisoned".to_string()).into_app_error();
        assert!(!app.message().contains("pool"));
    }

    #[test]
    fn test_unique_error_conversion() {
        let err: UserError =
            UniqueError::<sqlx::Error>::Configuration(ConfigurationError::EmptyFieldSet).into();
        assert!(matches!(err, UserError::Configuration(_)));

        let err: UserError = UniqueError::Storage(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_jwt_error_conversion() {
        assert!(matches!(
            UserError::from(JwtError::Expired),
            UserError::TokenExpired
        ));
        assert!(matches!(
            UserError::from(JwtError::Invalid),
            UserError::InvalidToken
        ));
    }
}
