//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The access code resolved to no student; no detail is disclosed
    #[error("Invalid access code")]
    InvalidAccessCode,

    /// Missing, malformed or expired session token
    #[error("Unauthorized")]
    Unauthorized,

    /// Missing or wrong operator key
    #[error("Forbidden")]
    Forbidden,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Too many failed logins from this client
    #[error("Too many login attempts")]
    TooManyAttempts,

    /// State store failure
    #[error("State store error: {0}")]
    Store(#[from] common::error::StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::InvalidAccessCode => {
                (StatusCode::UNAUTHORIZED, "Invalid access code".to_string())
            }
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts".to_string(),
            ),
            AuthError::Store(e) => {
                tracing::error!("State store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
