use crate::auth::AuthError;
use crate::database::DatabaseError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Top-level application error, mapped to HTTP responses at the boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
            AppError::Auth(err) => match err {
                // Collapsed to one message so the response does not reveal
                // whether the email exists or the password was wrong.
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials")
                }
                AuthError::UnsupportedProvider(_) => {
                    (StatusCode::BAD_REQUEST, "Unsupported OAuth provider")
                }
                AuthError::MissingParameter(_) => {
                    (StatusCode::BAD_REQUEST, "Missing required parameter")
                }
                AuthError::ExchangeFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "OAuth token exchange failed")
                }
                AuthError::UserInfoFetchFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "OAuth user info fetch failed")
                }
                AuthError::LinkFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Account linking failed")
                }
                AuthError::Repository(DatabaseError::Constraint(_)) => {
                    (StatusCode::CONFLICT, "Conflict")
                }
                AuthError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
                }
                AuthError::Hashing(_) | AuthError::Signing(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
                AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token"),
            },
            AppError::Database(DatabaseError::Constraint(_)) => (StatusCode::CONFLICT, "Conflict"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        // Credential failures keep the generic message in both fields; detail
        // strings for other errors are safe to echo.
        let message = match &self {
            AppError::Auth(AuthError::InvalidCredentials)
            | AppError::Auth(AuthError::UserNotFound) => error_message.to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}
