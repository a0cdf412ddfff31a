//! Admin authentication service.
//!
//! There is a single admin account configured through the environment; its
//! password is stored only as an Argon2 PHC string.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use crate::config::AdminCredentials;
use crate::models::CurrentAdmin;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    credentials: &'a AdminCredentials,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(credentials: &'a AdminCredentials) -> Self {
        Self { credentials }
    }

    /// Check a login attempt.
    ///
    /// The password is verified even when the username is wrong so both
    /// failures take the same time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for blank input and
    /// `AuthError::InvalidCredentials` for a wrong username or password.
    pub fn login(&self, username: &str, password: &str) -> Result<CurrentAdmin, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingField("usuario"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("contraseña"));
        }

        let password_ok =
            verify_password(password, self.credentials.password_hash.expose_secret()).is_ok();
        if !password_ok || username != self.credentials.username {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(CurrentAdmin::new(username))
    }
}

/// Hash a password into an Argon2 PHC string.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
