use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ContactError, LeadServiceError};

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors as seen by HTTP clients. Every variant renders as `{"error": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Carries only the public message; the cause is logged where it occurs.
    #[error("{0}")]
    Internal(&'static str),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a service failure, logging store errors with full detail and
    /// replacing them with `internal_message` in the response.
    pub fn from_lead_error(err: LeadServiceError, internal_message: &'static str) -> Self {
        match err {
            LeadServiceError::MissingFields | LeadServiceError::InvalidArgument(_) => {
                AppError::Validation(err.to_string())
            }
            LeadServiceError::EmailTaken => AppError::Conflict(err.to_string()),
            LeadServiceError::UserNotFound => AppError::NotFound(err.to_string()),
            LeadServiceError::RepositoryError(e) => {
                tracing::error!(error = %e, details = ?e, "{internal_message}");
                AppError::Internal(internal_message)
            }
        }
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::MissingFields => AppError::Validation(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected request body");
        AppError::Validation("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected query string");
        AppError::Validation("Invalid query parameters".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.to_string() });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::RepositoryError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (LeadServiceError::MissingFields, StatusCode::BAD_REQUEST),
            (
                LeadServiceError::InvalidArgument("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (LeadServiceError::EmailTaken, StatusCode::CONFLICT),
            (LeadServiceError::UserNotFound, StatusCode::NOT_FOUND),
            (
                LeadServiceError::RepositoryError(RepositoryError::Database(
                    sqlx::Error::PoolClosed,
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from_lead_error(err, "failed").status(), status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::from_lead_error(
            LeadServiceError::RepositoryError(RepositoryError::Database(sqlx::Error::PoolClosed)),
            "Internal server error. Please try again later.",
        );
        assert_eq!(
            err.to_string(),
            "Internal server error. Please try again later."
        );
    }

    #[test]
    fn conflict_message_matches_api_contract() {
        let err = AppError::from_lead_error(LeadServiceError::EmailTaken, "failed");
        assert_eq!(err.to_string(), "An account with this email already exists");
    }
}
