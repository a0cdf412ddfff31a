//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login for the single admin account

pub mod auth;

pub use auth::{AdminAuthService, AuthError, hash_password};
