//! Error conversions - From implementations for common error types
//!
//! Provides conversion from database errors to [`AppError`] and the
//! HTTP rendering of [`AppError`].

#[cfg(any(feature = "sqlx", feature = "axum"))]
use super::app_error::AppError;

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// PostgreSQL `unique_violation`
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Name of the violated constraint when `err` is a PostgreSQL unique violation
#[cfg(feature = "sqlx")]
pub fn unique_violation_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found").with_source(err),
            sqlx::Error::PoolTimedOut => {
                AppError::service_unavailable("Database connection pool exhausted").with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let app_err = match db_err.code().as_deref() {
                    Some(PG_UNIQUE_VIOLATION) => AppError::conflict("Duplicate key value"),
                    Some("23503") => AppError::conflict("Foreign key violation"),
                    Some("23502") => AppError::bad_request("Required field is null"),
                    Some("53000" | "53100" | "53200" | "53300") => {
                        AppError::service_unavailable("Database resource exhausted")
                    }
                    Some("57000" | "57014" | "57P01" | "57P02" | "57P03") => {
                        AppError::service_unavailable("Database unavailable")
                    }
                    _ => AppError::internal("Database error"),
                };
                app_err.with_source(err)
            }
            sqlx::Error::Io(_) => {
                AppError::service_unavailable("Database connection error").with_source(err)
            }
            _ => AppError::internal("Database error").with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Validation failures keep the API's `{data, errors}` envelope so
        // clients can bind messages to form fields.
        if let Some(errors) = self.field_errors() {
            let errors: serde_json::Map<String, serde_json::Value> = errors
                .iter()
                .map(|(path, message)| (path.to_string(), message.into()))
                .collect();
            let body = serde_json::json!({ "data": [], "errors": errors });
            return (status, Json(body)).into_response();
        }

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use crate::error::app_error::FieldErrors;
    use crate::error::kind::ErrorKind;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_validation_response_shape() {
        let mut errors = FieldErrors::new();
        errors.add("email", "This value is already used.");

        let response = AppError::validation(errors).into_response();
        assert_eq!(response.status(), 400);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"]["email"], "This value is already used.");
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_problem_details_shape() {
        let response = AppError::not_found("User not found").into_response();
        assert_eq!(response.status(), 404);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["title"], "Not Found");
        assert_eq!(body["detail"], "User not found");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_kind_is_preserved() {
        assert_eq!(
            AppError::service_unavailable("x").kind(),
            ErrorKind::ServiceUnavailable
        );
    }
}
