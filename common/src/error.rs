// common/src/error.rs
use thiserror::Error;

/// Failures of the credential and user-store layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No stored user carries the submitted username.
    #[error("user not found")]
    NotFound,

    /// The password does not match the stored hash.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("user store unavailable: {0}")]
    Store(String),
}
