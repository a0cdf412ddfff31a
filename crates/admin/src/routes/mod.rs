//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Check username and password (rate limited)
//! POST /auth/logout            - Logout
//!
//! # Panel
//! GET  /                       - Panel (?tab=products|drops), with counts
//!
//! # Products
//! GET  /products               - Product list (?q= searches name and category)
//! GET  /products/new           - Upload wizard, current step
//! POST /products/new/details   - Step 1: details
//! POST /products/new/images/{slot}        - Step 2: upload into a slot (multipart)
//! POST /products/new/images/{slot}/clear  - Step 2: empty a slot
//! POST /products/new/review    - Step 2 -> 3 (main photo required)
//! POST /products/new/back      - Previous step
//! POST /products/new/cancel    - Discard the draft
//! POST /products/new/submit    - Step 3: create the product
//! POST /products/images/{slot} - Upload for the edit form (URL field fragment)
//! GET  /products/{id}/edit     - Edit form
//! POST /products/{id}          - Update
//! POST /products/{id}/delete   - Delete
//!
//! # Drops
//! GET  /drops                  - Active and inactive drops
//! GET  /drops/new              - New drop form
//! POST /drops                  - Create (id = "drop{number}")
//! POST /drops/images/{slot}    - Hero image upload (URL field fragment)
//! GET  /drops/{id}/edit        - Edit form (id not editable)
//! POST /drops/{id}             - Partial update
//! POST /drops/{id}/toggle      - Flip the active flag
//! POST /drops/{id}/delete      - Delete
//! ```

pub mod auth;
pub mod drops;
pub mod panel;
pub mod products;
pub mod uploads;

use axum::{Router, http::HeaderMap, routing::get};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash, session_keys};
use crate::state::AppState;

/// Build the admin router (everything except health and static files).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(panel::index))
        .merge(auth::router())
        .merge(products::router())
        .merge(drops::router())
}

/// Logged-in admin shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub username: String,
}

impl From<&CurrentAdmin> for AdminView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            username: admin.username.clone(),
        }
    }
}

/// Queue a message for the next page render.
pub(crate) async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Take the queued message, if any.
pub(crate) async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Whether the request came from the page script.
pub(crate) fn wants_fragment(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}
