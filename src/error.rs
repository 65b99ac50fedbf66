//! Domain error types for the test execution engine.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Referenced case, cycle, step, execution or defect is missing
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate name within a project or duplicate in-flight allocation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation failure (evidence bound exceeded, malformed patch, ...)
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Foreign-key violation surfaced with a human-readable cause
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Actor lacks the access level required by the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// Classify a database error, prefixing the message with `context`.
    ///
    /// Unique violations become `Conflict`, foreign-key violations become
    /// `IntegrityViolation`; everything else is a plain `Database` error.
    pub fn from_db(context: &str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("{context}: duplicate value ({detail})"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => AppError::IntegrityViolation(
                format!("{context}: a referenced record is missing or still in use ({detail})"),
            ),
            _ => AppError::Database(format!("{context}: {err}")),
        }
    }

    /// Closure adapter for `map_err`.
    pub fn db(context: &'static str) -> impl FnOnce(DbErr) -> AppError {
        move |err| AppError::from_db(context, err)
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::Conflict(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "CONFLICT",
                self.to_string(),
            ),
            AppError::Rejected(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "REJECTED",
                self.to_string(),
            ),
            AppError::IntegrityViolation(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "INTEGRITY_VIOLATION",
                self.to_string(),
            ),
            AppError::Forbidden(_) => (
                actix_web::http::StatusCode::FORBIDDEN,
                "FORBIDDEN",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Rejected(format!("JSON encoding error: {}", err))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::from_db("Database operation failed", err)
    }
}
