//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (stricter CSP for admin, no-store)
//! 5. Session layer (tower-sessions, `SameSite=Strict`)
//! 6. Auth (the `RequireAdminAuth` extractor on protected handlers)
//! 7. Rate limiting on `POST /auth/login` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    LOGIN_PATH, OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::{AdminSecurityPolicy, security_headers_middleware};
pub use session::create_session_layer;
