// web-server/src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::AuthError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by API handlers as `{ "message": ... }` bodies
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_login() -> Self {
        ApiError::Unauthorized("Invalid username or password".to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Same answer for both so usernames cannot be probed
            AuthError::NotFound | AuthError::InvalidCredential => ApiError::invalid_login(),
            AuthError::UsernameTaken(username) => {
                ApiError::Conflict(format!("Username {} is already taken", username))
            }
            AuthError::Hashing(detail) | AuthError::Store(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<actix::MailboxError> for ApiError {
    fn from(err: actix::MailboxError) -> Self {
        ApiError::Internal(format!("session store unavailable: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
