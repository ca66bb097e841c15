//! Application error type.
//!
//! Every handler returns `Result<_, AppError>`. The error renders as
//! `{"message": ..., "errors": [...]}` with the matching status code; server
//! side failures are logged and replaced by a generic message.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A single failed field check, reported back in the `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Access token required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(e) if constraint_code(e).is_some() => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        let message = match &self {
            AppError::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            AppError::Database(e) => match constraint_code(e) {
                Some(UNIQUE_VIOLATION) => "Resource already exists".to_string(),
                Some(NUMERIC_OUT_OF_RANGE) => "Value out of range".to_string(),
                Some(_) => "Referenced resource does not exist".to_string(),
                None => {
                    log::error!("Database error: {}", e);
                    "Internal server error".to_string()
                }
            },
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let errors = match self {
            AppError::Validation(errors) => errors,
            _ => Vec::new(),
        };

        ErrorBody { message, errors }
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NUMERIC_OUT_OF_RANGE: &str = "22003";

fn constraint_code(e: &sqlx::Error) -> Option<&'static str> {
    let code = e.as_database_error()?.code()?;
    match code.as_ref() {
        UNIQUE_VIOLATION => Some(UNIQUE_VIOLATION),
        FOREIGN_KEY_VIOLATION => Some(FOREIGN_KEY_VIOLATION),
        NUMERIC_OUT_OF_RANGE => Some(NUMERIC_OUT_OF_RANGE),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::InvalidToken
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", e))
    }
}

/// `Json` extractor whose rejections render as a 400 `AppError`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::validation("email", "Invalid email address").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Order").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BusinessRule("no".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_body_lists_field_errors() {
        let body = AppError::Validation(vec![
            FieldError::new("email", "Invalid email address"),
            FieldError::new("password", "Password must be at least 6 characters"),
        ])
        .body();

        assert_eq!(body.message, "Validation error");
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[1].field, "password");
    }

    #[test]
    fn server_errors_hide_details() {
        let body = AppError::Internal("secret detail".into()).body();
        assert_eq!(body.message, "Internal server error");
        assert!(body.errors.is_empty());
    }

    #[sqlx::test(migrations = false)]
    async fn out_of_range_value_is_a_bad_request(pool: sqlx::PgPool) {
        let err = sqlx::query("SELECT 2147483647::int4 + 1")
            .execute(&pool)
            .await
            .unwrap_err();

        let err = AppError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().message, "Value out of range");
    }

    #[test]
    fn not_found_names_the_resource() {
        assert_eq!(AppError::NotFound("Product").body().message, "Product not found");
    }
}
