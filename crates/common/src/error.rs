//! Error types for classreg.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found or suspended: {0}")]
    UserNotFoundOrSuspended(String),

    #[error("User is not a teacher: {0}")]
    UserNotTeacher(String),

    #[error("User is not a student: {0}")]
    UserNotStudent(String),

    #[error("At least one teacher email could not be resolved")]
    EmailTeacherNotFound,

    #[error("Account already suspended: {0}")]
    AccountAlreadySuspended(String),

    #[error("Account is not verified: {0}")]
    AccountUnverified(String),

    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFoundOrSuspended(_) | Self::EmailTeacherNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::UserNotTeacher(_)
            | Self::UserNotStudent(_)
            | Self::AccountAlreadySuspended(_)
            | Self::AccountUnverified(_)
            | Self::AccountInactive(_)
            | Self::BadRequest(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Redis(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the stable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFoundOrSuspended(_) => "USER_NOT_FOUND_OR_SUSPENDED",
            Self::UserNotTeacher(_) => "USER_NOT_TEACHER",
            Self::UserNotStudent(_) => "USER_NOT_STUDENT",
            Self::EmailTeacherNotFound => "EMAIL_TEACHER_NOT_FOUND",
            Self::AccountAlreadySuspended(_) => "ACCOUNT_ALREADY_SUSPENDED",
            Self::AccountUnverified(_) => "ACCOUNT_UNVERIFIED",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_violations_map_to_4xx() {
        assert_eq!(
            AppError::UserNotTeacher("t@x.com".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UserNotStudent("s@x.com".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AccountAlreadySuspended("s@x.com".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::EmailTeacherNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("no access".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn infrastructure_failures_map_to_500() {
        assert!(AppError::Database("boom".to_string()).is_server_error());
        assert!(AppError::Redis("down".to_string()).is_server_error());
        assert!(!AppError::EmailTeacherNotFound.is_server_error());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            AppError::AccountUnverified("a@x.com".to_string()).error_code(),
            "ACCOUNT_UNVERIFIED"
        );
        assert_eq!(
            AppError::UserNotFoundOrSuspended("a@x.com".to_string()).error_code(),
            "USER_NOT_FOUND_OR_SUSPENDED"
        );
    }
}
