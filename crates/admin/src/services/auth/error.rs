//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A form field was left blank.
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Hashing a new password failed.
    #[error("password hashing failed")]
    PasswordHash,
}
