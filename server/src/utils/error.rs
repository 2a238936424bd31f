use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::repository::StoreError;
use crate::services::rsvp::RsvpError;
use crate::utils::response::{error as error_response, message as message_response};
use crate::validation::schedule::ScheduleViolation;
use crate::validation::FieldErrors;

pub const EVENT_NOT_FOUND: &str = "Event not found";
pub const RESOURCE_NOT_FOUND: &str = "Resource not found";
pub const RSVP_UNSUCCESSFUL: &str = "unsuccessful";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("RSVP rejected: {0}")]
    Rsvp(RsvpError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn event_not_found() -> Self {
        AppError::NotFound(EVENT_NOT_FOUND.to_string())
    }

    pub fn resource_not_found() -> Self {
        AppError::NotFound(RESOURCE_NOT_FOUND.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Rsvp(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Rsvp(_) => "RSVP_REJECTED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(fields) => {
                warn!(code = self.code(), errors = %fields, "Request rejected");
            }
            AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::Rsvp(reason) => {
                warn!(code = self.code(), reason = %reason, "RSVP rejected");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                AppError::Conflict(format!("Record already exists ({constraint})"))
            }
            StoreError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<RsvpError> for AppError {
    fn from(err: RsvpError) -> Self {
        match err {
            RsvpError::Store(e) => e.into(),
            other => AppError::Rsvp(other),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl From<ScheduleViolation> for AppError {
    fn from(violation: ScheduleViolation) -> Self {
        AppError::ValidationError(violation.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        match self {
            AppError::NotFound(msg) => message_response(status, msg),
            AppError::Rsvp(_) => message_response(status, RSVP_UNSUCCESSFUL),
            AppError::ValidationError(fields) => {
                let details = serde_json::to_value(&fields).ok();
                error_response(code, "Validation failed", details, status)
            }
            AppError::AuthError(msg) | AppError::Forbidden(msg) | AppError::Conflict(msg) => {
                error_response(code, msg, None, status)
            }
            // Do not expose internal details in the API response
            AppError::DatabaseError(_) => {
                error_response(code, "A database error occurred", None, status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::event_not_found().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Rsvp(RsvpError::AlreadyAttending).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError(FieldErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rsvp_store_errors_become_conflicts() {
        let err = AppError::from(RsvpError::Store(StoreError::Conflict("users_pkey".into())));
        assert!(matches!(err, AppError::Conflict(_)));

        let err = AppError::from(RsvpError::NotAttending);
        assert!(matches!(err, AppError::Rsvp(RsvpError::NotAttending)));
    }

    #[test]
    fn test_database_errors_are_server_errors() {
        let err = AppError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.code(), "DATABASE_ERROR");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
