//! Drop route handlers.
//!
//! New drops get their id from the number (`drop03`); the id is fixed once
//! created. Toggle and delete answer with the refreshed drop lists when
//! called from the page script.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use blessed_core::media::UploadKind;
use blessed_core::{DropId, DropUpdate};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::panel::{DROPS_LOAD_ERROR, DropListTemplate, drop_rows};
use super::uploads::{self, ImageFieldTemplate, MAX_UPLOAD_BYTES, slot_label};
use super::{AdminView, set_flash, wants_fragment};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{DropForm, Flash};
use crate::state::AppState;

const DROPS_TAB: &str = "/?tab=drops";
const SAVE_FAILED: &str = "Error al guardar el drop.";
const TOGGLE_FAILED: &str = "Error al cambiar estado del drop.";
const DELETE_FAILED: &str = "Error al eliminar el drop.";

/// Build the drop routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drops", get(index).post(create))
        .route("/drops/new", get(new_drop))
        .route("/drops/{id}/edit", get(edit))
        .route("/drops/{id}", post(update))
        .route("/drops/{id}/toggle", post(toggle))
        .route("/drops/{id}/delete", post(delete))
        .route(
            "/drops/images/{slot}",
            post(uploads::upload_drop_field).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

// =============================================================================
// Views
// =============================================================================

/// Drop create/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "drops/form.html")]
pub struct DropFormTemplate {
    pub admin_user: AdminView,
    pub current_path: String,
    /// Set when editing; the id is shown but not editable.
    pub editing_id: Option<String>,
    pub action: String,
    pub form: DropForm,
    pub error: Option<String>,
    pub image_fields: Vec<ImageFieldTemplate>,
}

impl DropFormTemplate {
    fn new(admin: AdminView, editing_id: Option<&DropId>, form: DropForm) -> Self {
        let (current_path, action) = match editing_id {
            Some(id) => (format!("/drops/{id}/edit"), format!("/drops/{id}")),
            None => ("/drops/new".to_string(), "/drops".to_string()),
        };
        let image_fields = [&form.hero_image, &form.hero_image2]
            .into_iter()
            .enumerate()
            .map(|(slot, url)| {
                let label = slot_label(UploadKind::Drop, slot);
                ImageFieldTemplate::new(UploadKind::Drop, slot, &label, url)
            })
            .collect();
        Self {
            admin_user: admin,
            current_path,
            editing_id: editing_id.map(ToString::to_string),
            action,
            form,
            error: None,
            image_fields,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Drop lists from the cache.
async fn list_fragment(state: &AppState) -> DropListTemplate {
    match state.backend().list_drops().await {
        Ok(drops) => {
            let (active_drops, inactive_drops) = drop_rows(&drops);
            DropListTemplate {
                active_drops,
                inactive_drops,
                load_error: None,
            }
        }
        Err(e) => {
            tracing::error!("Failed to load drops: {e}");
            DropListTemplate {
                active_drops: Vec::new(),
                inactive_drops: Vec::new(),
                load_error: Some(DROPS_LOAD_ERROR),
            }
        }
    }
}

/// Refreshed lists for the page script, otherwise back to the drops tab.
async fn list_response(state: &AppState, headers: &HeaderMap) -> Response {
    if wants_fragment(headers) {
        list_fragment(state).await.into_response()
    } else {
        Redirect::to(DROPS_TAB).into_response()
    }
}

/// Delete form data.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub label: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Active and inactive drops.
///
/// GET /drops
#[instrument(skip(state, headers))]
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    list_response(&state, &headers).await
}

/// Empty form for a new drop.
///
/// GET /drops/new
pub async fn new_drop(RequireAdminAuth(admin): RequireAdminAuth) -> DropFormTemplate {
    DropFormTemplate::new(AdminView::from(&admin), None, DropForm::default())
}

/// Create a drop.
///
/// POST /drops
#[instrument(skip(admin, state, session, form), fields(number = %form.number))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DropForm>,
) -> Response {
    let input = match form.to_input(None) {
        Ok(input) => input,
        Err(e) => {
            let page = DropFormTemplate::new(AdminView::from(&admin), None, form)
                .with_error(e.to_string());
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match state.backend().create_drop(&input).await {
        Ok(()) => {
            tracing::info!(drop_id = %input.id, "Drop created");
            set_flash(
                &session,
                Flash::success(format!("\"{}\" creado correctamente.", input.label)),
            )
            .await;
            Redirect::to(DROPS_TAB).into_response()
        }
        Err(e) => {
            tracing::error!(drop_id = %input.id, "Failed to create drop: {e}");
            let page = DropFormTemplate::new(AdminView::from(&admin), None, form)
                .with_error(SAVE_FAILED);
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

/// Edit form, prefilled.
///
/// GET /drops/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<DropFormTemplate> {
    let drop = state.backend().get_drop(&DropId::new(id)).await?;
    Ok(DropFormTemplate::new(
        AdminView::from(&admin),
        Some(&drop.id),
        DropForm::from(&drop),
    ))
}

/// Save an edited drop as a partial update.
///
/// POST /drops/{id}
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DropForm>,
) -> Response {
    let id = DropId::new(id);
    let input = match form.to_input(Some(&id)) {
        Ok(input) => input,
        Err(e) => {
            let page = DropFormTemplate::new(AdminView::from(&admin), Some(&id), form)
                .with_error(e.to_string());
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };
    let label = input.label.clone();

    match state.backend().update_drop(&id, &DropUpdate::from(input)).await {
        Ok(()) => {
            tracing::info!(drop_id = %id, "Drop updated");
            set_flash(
                &session,
                Flash::success(format!("\"{label}\" actualizado correctamente.")),
            )
            .await;
            Redirect::to(DROPS_TAB).into_response()
        }
        Err(e) => {
            tracing::error!(drop_id = %id, "Failed to update drop: {e}");
            let page = DropFormTemplate::new(AdminView::from(&admin), Some(&id), form)
                .with_error(SAVE_FAILED);
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

/// Flip a drop's active flag.
///
/// POST /drops/{id}/toggle
#[instrument(skip(state, session, headers))]
pub async fn toggle(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let id = DropId::new(id);
    let backend = state.backend();

    let result = match backend.get_drop(&id).await {
        Ok(drop) => backend
            .update_drop(&id, &DropUpdate::active(!drop.active))
            .await
            .map(|()| drop),
        Err(e) => Err(e),
    };

    let flash = match result {
        Ok(drop) => {
            let verb = if drop.active { "desactivado" } else { "activado" };
            tracing::info!(drop_id = %id, active = !drop.active, "Drop toggled");
            Flash::success(format!("\"{}\" {verb}.", drop.label))
        }
        Err(e) => {
            tracing::error!(drop_id = %id, "Failed to toggle drop: {e}");
            Flash::error(TOGGLE_FAILED)
        }
    };
    set_flash(&session, flash).await;
    list_response(&state, &headers).await
}

/// Delete a drop.
///
/// POST /drops/{id}/delete
#[instrument(skip(state, session, headers, form))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let id = DropId::new(id);
    let label = if form.label.trim().is_empty() {
        id.to_string()
    } else {
        form.label.trim().to_string()
    };

    let flash = match state.backend().delete_drop(&id).await {
        Ok(()) => {
            tracing::info!(drop_id = %id, "Drop deleted");
            Flash::success(format!("\"{label}\" eliminado."))
        }
        Err(e) => {
            tracing::error!(drop_id = %id, "Failed to delete drop: {e}");
            Flash::error(DELETE_FAILED)
        }
    };
    set_flash(&session, flash).await;
    list_response(&state, &headers).await
}
