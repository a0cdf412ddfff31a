//! Authentication route handlers for admin.
//!
//! A single username and password pair, checked against the Argon2 hash
//! from the environment. Login attempts are rate limited per IP.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    LOGIN_PATH, OptionalAdminAuth, clear_current_admin, login_rate_limiter, set_current_admin,
};
use crate::services::{AdminAuthService, AuthError};
use crate::state::AppState;

const INVALID_LOGIN: &str = "Usuario o contraseña incorrectos.";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page))
        .route(LOGIN_PATH, post(login).layer(login_rate_limiter()))
        .route("/auth/logout", post(logout))
}

/// Render the login page, or skip it when already logged in.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        username: String::new(),
        error: None,
    }
    .into_response()
}

/// Check credentials and start a session.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(username = %form.username.trim()))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credentials = state.config().credentials.clone();
    let username = form.username.clone();

    // Argon2 verification is CPU-bound
    let outcome = tokio::task::spawn_blocking(move || {
        AdminAuthService::new(&credentials).login(&form.username, &form.password)
    })
    .await
    .map_err(|e| AppError::Internal(format!("login task failed: {e}")))?;

    match outcome {
        Ok(admin) => {
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.username);
            tracing::info!("Admin logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let error = match e {
                AuthError::MissingField(field) => format!("Completá el campo {field}."),
                AuthError::InvalidCredentials | AuthError::PasswordHash => {
                    INVALID_LOGIN.to_string()
                }
            };
            tracing::warn!(error = %e, "Admin login rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    username: username.trim().to_string(),
                    error: Some(error),
                },
            )
                .into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!("Failed to clear admin session: {e}");
    }
    clear_sentry_user();
    Redirect::to(LOGIN_PATH)
}
