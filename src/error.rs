use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blob::BlobError;
use crate::roster::RosterError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid or expired token")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin role required")]
    Forbidden,

    #[error("Event not found: {id}")]
    EventNotFound { id: i64 },

    #[error("Participant not found: {id}")]
    ParticipantNotFound { id: i64 },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Image not found: {key}")]
    ImageNotFound { key: String },

    #[error("No participants found for event {event_id}")]
    NoParticipants { event_id: i64 },

    #[error("Participant {id} is already checked in")]
    AlreadyCheckedIn { id: i64 },

    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Blob storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Roster(RosterError::Export(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AppError::Roster(_) => (StatusCode::BAD_REQUEST, "INVALID_ROSTER"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::EventNotFound { .. } => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            AppError::ParticipantNotFound { .. } => {
                (StatusCode::NOT_FOUND, "PARTICIPANT_NOT_FOUND")
            }
            AppError::UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AppError::ImageNotFound { .. } => (StatusCode::NOT_FOUND, "IMAGE_NOT_FOUND"),
            AppError::NoParticipants { .. } => (StatusCode::NOT_FOUND, "NO_PARTICIPANTS"),
            AppError::AlreadyCheckedIn { .. } => (StatusCode::CONFLICT, "ALREADY_CHECKED_IN"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Blob(BlobError::InvalidKey(_)) => (StatusCode::BAD_REQUEST, "INVALID_KEY"),
            AppError::Blob(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let message = match db_err.constraint() {
                    Some("participants_event_id_bib_no_key") => {
                        "Bib number already exists for this event".to_string()
                    }
                    Some("users_user_name_key") => "User name already taken".to_string(),
                    _ => "Record already exists".to_string(),
                };
                return AppError::Conflict { message };
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            match status {
                StatusCode::SERVICE_UNAVAILABLE => self.to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let (status, code) = AppError::EventNotFound { id: 3 }.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "EVENT_NOT_FOUND");

        let (status, _) = AppError::ParticipantNotFound { id: 3 }.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_blob_key_is_client_error() {
        let err = AppError::from(BlobError::InvalidKey("../etc/passwd".to_string()));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn already_checked_in_is_conflict() {
        let response = AppError::AlreadyCheckedIn { id: 9 }.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn server_errors_hide_details() {
        let response = AppError::Internal("secret path /var/x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
