//! Product route handlers: list, upload wizard, edit and delete.
//!
//! The new-product wizard lives in the session as a [`ProductDraft`]. Each
//! step is a plain form POST followed by a redirect back to
//! `/products/new`; image slots are also swapped in place by
//! `static/js/admin.js`, which sends `HX-Request` and gets the slot fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use blessed_core::media::{ImageSlots, SlotState, UploadKind, transform_url};
use blessed_core::product::ProductValidationError;
use blessed_core::wizard::{StepIndicator, UploadStep, indicators};
use blessed_core::{Category, Drop, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::panel::{PRODUCTS_LOAD_ERROR, ProductListTemplate, ProductRow, product_rows};
use super::uploads::{
    self, ImageFieldTemplate, MAX_UPLOAD_BYTES, PREVIEW_IMAGE, UPLOAD_FAILED, check_slot,
    discard_image, read_image, send_image, slot_label,
};
use super::{AdminView, set_flash, take_flash, wants_fragment};
use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, ProductDraft, ProductForm, session_keys};
use crate::state::AppState;

const WIZARD_PATH: &str = "/products/new";
const PRODUCTS_TAB: &str = "/?tab=products";
const SAVE_FAILED: &str = "Error al guardar el producto.";
const DELETE_FAILED: &str = "Error al eliminar el producto.";

/// Build the product routes.
pub fn router() -> Router<AppState> {
    let uploads = Router::new()
        .route("/products/new/images/{slot}", post(upload_slot))
        .route("/products/images/{slot}", post(uploads::upload_product_field))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/products", get(index))
        .route(WIZARD_PATH, get(wizard))
        .route("/products/new/details", post(details))
        .route("/products/new/images/{slot}/clear", post(clear_slot))
        .route("/products/new/review", post(review))
        .route("/products/new/back", post(back))
        .route("/products/new/cancel", post(cancel))
        .route("/products/new/submit", post(submit))
        .route("/products/{id}/edit", get(edit))
        .route("/products/{id}", post(update))
        .route("/products/{id}/delete", post(delete))
        .merge(uploads)
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_draft(session: &Session) -> ProductDraft {
    session
        .get::<ProductDraft>(session_keys::PRODUCT_DRAFT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_draft(session: &Session, draft: &ProductDraft) -> Result<()> {
    session.insert(session_keys::PRODUCT_DRAFT, draft).await?;
    Ok(())
}

async fn clear_draft(session: &Session) -> Result<()> {
    session
        .remove::<ProductDraft>(session_keys::PRODUCT_DRAFT)
        .await?;
    Ok(())
}

// =============================================================================
// Views
// =============================================================================

/// Category choice for the select.
#[derive(Clone)]
pub struct CategoryOption {
    pub slug: &'static str,
    pub label: &'static str,
}

fn category_options() -> Vec<CategoryOption> {
    Category::ALL
        .into_iter()
        .map(|c| CategoryOption {
            slug: c.slug(),
            label: c.label(),
        })
        .collect()
}

/// Drop choice for the select.
#[derive(Clone)]
pub struct DropOption {
    pub id: String,
    pub label: String,
}

impl From<&Drop> for DropOption {
    fn from(drop: &Drop) -> Self {
        Self {
            id: drop.id.to_string(),
            label: format!("{} · {}", drop.filter_label(), drop.label),
        }
    }
}

/// Drops for the select; an unavailable list leaves it empty.
async fn drop_options(state: &AppState) -> Vec<Drop> {
    match state.backend().list_drops().await {
        Ok(drops) => drops,
        Err(e) => {
            tracing::warn!("Failed to load drops for product form: {e}");
            Vec::new()
        }
    }
}

/// One image slot of the wizard.
#[derive(Template, WebTemplate)]
#[template(path = "partials/image_slot.html")]
pub struct ImageSlotTemplate {
    pub slot: usize,
    pub label: String,
    pub required: bool,
    pub state: &'static str,
    pub percent: u8,
    pub url: Option<String>,
    pub preview: Option<String>,
    pub error: Option<String>,
}

impl ImageSlotTemplate {
    fn new(slot: usize, state: &SlotState) -> Self {
        let (name, percent) = match state {
            SlotState::Empty => ("empty", 0),
            SlotState::Uploading { percent } => ("uploading", *percent),
            SlotState::Done { .. } => ("done", 100),
            SlotState::Error => ("error", 0),
        };
        let url = state.url().map(str::to_string);
        Self {
            slot,
            label: slot_label(UploadKind::Product, slot),
            required: slot == 0,
            state: name,
            percent,
            preview: url
                .as_deref()
                .map(|u| transform_url(u, PREVIEW_IMAGE)),
            url,
            error: matches!(state, SlotState::Error).then(|| UPLOAD_FAILED.to_string()),
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

fn slot_views(images: &ImageSlots) -> Vec<ImageSlotTemplate> {
    images
        .slots()
        .iter()
        .enumerate()
        .map(|(i, state)| ImageSlotTemplate::new(i, state))
        .collect()
}

/// Review step summary.
#[derive(Clone)]
pub struct ReviewView {
    pub row: ProductRow,
    pub drop_label: String,
    pub description: Option<String>,
    pub images: Vec<String>,
}

/// Upload wizard page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/wizard.html")]
pub struct WizardTemplate {
    pub admin_user: AdminView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub steps: Vec<StepIndicator>,
    pub step: &'static str,
    pub form: ProductForm,
    pub error: Option<String>,
    pub categories: Vec<CategoryOption>,
    pub drops: Vec<DropOption>,
    pub slots: Vec<ImageSlotTemplate>,
    pub can_review: bool,
    pub review: Option<ReviewView>,
}

const fn step_name(step: UploadStep) -> &'static str {
    match step {
        UploadStep::Details => "details",
        UploadStep::Images => "images",
        UploadStep::Review => "review",
    }
}

impl WizardTemplate {
    fn new(admin: AdminView, flash: Option<Flash>, draft: &ProductDraft, drops: &[Drop]) -> Self {
        let review = (draft.step == UploadStep::Review).then(|| {
            let product = draft.form.to_product(draft.images.urls(), None);
            ReviewView {
                row: ProductRow::from(&product),
                drop_label: drops
                    .iter()
                    .find(|d| d.id == product.drop)
                    .map_or_else(|| product.drop.to_string(), |d| DropOption::from(d).label),
                description: product.description.clone(),
                images: product
                    .images
                    .iter()
                    .map(|u| transform_url(u, PREVIEW_IMAGE))
                    .collect(),
            }
        });

        Self {
            admin_user: admin,
            current_path: WIZARD_PATH.to_string(),
            flash,
            steps: indicators(draft.step),
            step: step_name(draft.step),
            form: draft.form.clone(),
            error: None,
            categories: category_options(),
            drops: drops.iter().map(DropOption::from).collect(),
            slots: slot_views(&draft.images),
            can_review: draft.images.has_required(),
            review,
        }
    }
}

/// Edit form page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct EditTemplate {
    pub admin_user: AdminView,
    pub current_path: String,
    pub form: ProductForm,
    pub error: Option<String>,
    pub categories: Vec<CategoryOption>,
    pub drops: Vec<DropOption>,
    pub image_fields: Vec<ImageFieldTemplate>,
}

fn image_fields(urls: &[String]) -> Vec<ImageFieldTemplate> {
    (0..UploadKind::Product.slot_count())
        .map(|i| {
            let url = urls.get(i).map_or("", String::as_str);
            ImageFieldTemplate::new(
                UploadKind::Product,
                i,
                &slot_label(UploadKind::Product, i),
                url,
            )
        })
        .collect()
}

// =============================================================================
// Forms
// =============================================================================

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
}

/// Edit form: product fields plus one URL per image slot.
#[derive(Debug, Deserialize)]
pub struct EditProductForm {
    #[serde(flatten)]
    pub product: ProductForm,
    #[serde(default)]
    pub image_0: String,
    #[serde(default)]
    pub image_1: String,
    #[serde(default)]
    pub image_2: String,
    #[serde(default)]
    pub image_3: String,
}

impl EditProductForm {
    /// Non-empty image URLs in slot order.
    #[must_use]
    pub fn images(&self) -> Vec<String> {
        [&self.image_0, &self.image_1, &self.image_2, &self.image_3]
            .into_iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Delete form data.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Product list, filtered by the search box.
///
/// GET /products
#[instrument(skip(state, headers))]
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if !wants_fragment(&headers) {
        let target = if query.q.trim().is_empty() {
            PRODUCTS_TAB.to_string()
        } else {
            format!("{PRODUCTS_TAB}&q={}", urlencoding::encode(query.q.trim()))
        };
        return Redirect::to(&target).into_response();
    }

    let (products, load_error) = match state.backend().list_products().await {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::error!("Failed to load products: {e}");
            (Vec::new(), Some(PRODUCTS_LOAD_ERROR))
        }
    };
    ProductListTemplate {
        products: product_rows(&products, &query.q),
        q: query.q.trim().to_string(),
        load_error,
    }
    .into_response()
}

/// Show the wizard at its current step.
///
/// GET /products/new
#[instrument(skip(admin, state, session))]
pub async fn wizard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> WizardTemplate {
    let mut draft = load_draft(&session).await;
    let drops = drop_options(&state).await;
    let first_active = drops.iter().find(|d| d.active).map(|d| &d.id);
    draft.form.default_drop(first_active);

    WizardTemplate::new(
        AdminView::from(&admin),
        take_flash(&session).await,
        &draft,
        &drops,
    )
}

/// Step 1: store the details.
///
/// POST /products/new/details
#[instrument(skip(admin, state, session, form), fields(product_id = %form.id))]
pub async fn details(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let mut draft = load_draft(&session).await;

    if let Err(e) = form.validate_details() {
        draft.form = form;
        let drops = drop_options(&state).await;
        let mut page = WizardTemplate::new(AdminView::from(&admin), None, &draft, &drops);
        page.error = Some(e.to_string());
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    draft.set_details(form);
    save_draft(&session, &draft).await?;
    Ok(Redirect::to(WIZARD_PATH).into_response())
}

/// Step 2: upload a file into a slot.
///
/// POST /products/new/images/{slot}
#[instrument(skip(state, session, headers, multipart))]
pub async fn upload_slot(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(slot): Path<usize>,
    mut multipart: Multipart,
) -> Result<Response> {
    check_slot(UploadKind::Product, slot)?;
    let mut draft = load_draft(&session).await;

    let file = match read_image(&mut multipart).await {
        Ok(file) => file,
        Err(rejection) => {
            if wants_fragment(&headers) {
                let state = draft.images.slots().get(slot).cloned().unwrap_or_default();
                return Ok((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ImageSlotTemplate::new(slot, &state).with_error(rejection.to_string()),
                )
                    .into_response());
            }
            set_flash(&session, Flash::error(rejection.to_string())).await;
            return Ok(Redirect::to(WIZARD_PATH).into_response());
        }
    };

    match send_image(state.backend(), UploadKind::Product, slot, file).await {
        Ok(image) => {
            let replaced = draft.images.set_done(slot, image)?;
            discard_image(state.backend(), replaced);
            save_draft(&session, &draft).await?;
            slot_response(&headers, &draft, slot, StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(slot, "Product image upload failed: {e}");
            if draft.images.fail_upload(slot)? {
                save_draft(&session, &draft).await?;
                return slot_response(&headers, &draft, slot, StatusCode::BAD_GATEWAY);
            }
            // The slot keeps its previous image
            if !wants_fragment(&headers) {
                set_flash(&session, Flash::error(UPLOAD_FAILED)).await;
                return Ok(Redirect::to(WIZARD_PATH).into_response());
            }
            let state = draft.images.slots().get(slot).cloned().unwrap_or_default();
            Ok((
                StatusCode::BAD_GATEWAY,
                ImageSlotTemplate::new(slot, &state).with_error(UPLOAD_FAILED),
            )
                .into_response())
        }
    }
}

/// Step 2: empty a slot.
///
/// POST /products/new/images/{slot}/clear
#[instrument(skip(state, session, headers))]
pub async fn clear_slot(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(slot): Path<usize>,
) -> Result<Response> {
    let mut draft = load_draft(&session).await;
    let removed = draft.images.clear(slot)?;
    discard_image(state.backend(), removed);
    save_draft(&session, &draft).await?;

    slot_response(&headers, &draft, slot, StatusCode::OK)
}

/// Slot fragment for the page script, otherwise back to the wizard.
fn slot_response(
    headers: &HeaderMap,
    draft: &ProductDraft,
    slot: usize,
    status: StatusCode,
) -> Result<Response> {
    if !wants_fragment(headers) {
        return Ok(Redirect::to(WIZARD_PATH).into_response());
    }
    let state = draft
        .images
        .slots()
        .get(slot)
        .ok_or_else(|| AppError::NotFound(format!("slot {slot}")))?;
    Ok((status, ImageSlotTemplate::new(slot, state)).into_response())
}

/// Step 2 -> 3.
///
/// POST /products/new/review
#[instrument(skip(session))]
pub async fn review(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
) -> Result<Redirect> {
    let mut draft = load_draft(&session).await;
    if draft.review() {
        save_draft(&session, &draft).await?;
    } else {
        set_flash(
            &session,
            Flash::error(ProductValidationError::MissingMainImage.to_string()),
        )
        .await;
    }
    Ok(Redirect::to(WIZARD_PATH))
}

/// Go back one step, keeping everything entered.
///
/// POST /products/new/back
#[instrument(skip(session))]
pub async fn back(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
) -> Result<Redirect> {
    let mut draft = load_draft(&session).await;
    draft.back();
    save_draft(&session, &draft).await?;
    Ok(Redirect::to(WIZARD_PATH))
}

/// Throw the draft away, deleting its uploads.
///
/// POST /products/new/cancel
#[instrument(skip(state, session))]
pub async fn cancel(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    let mut draft = load_draft(&session).await;
    for slot in 0..draft.images.slots().len() {
        discard_image(state.backend(), draft.images.clear(slot)?);
    }
    clear_draft(&session).await?;
    Ok(Redirect::to(PRODUCTS_TAB))
}

/// Step 3: create the product.
///
/// POST /products/new/submit
#[instrument(skip(state, session))]
pub async fn submit(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    let mut draft = load_draft(&session).await;
    if draft.step != UploadStep::Review {
        return Ok(Redirect::to(WIZARD_PATH));
    }

    let product = draft.form.to_product(draft.images.urls(), None);
    if let Err(e) = product.validate() {
        set_flash(&session, Flash::error(e.to_string())).await;
        draft.step = UploadStep::Details;
        save_draft(&session, &draft).await?;
        return Ok(Redirect::to(WIZARD_PATH));
    }

    match state.backend().create_product(&product).await {
        Ok(()) => {
            clear_draft(&session).await?;
            tracing::info!(product_id = %product.id, "Product created");
            set_flash(
                &session,
                Flash::success(format!("\"{}\" agregado correctamente.", product.name)),
            )
            .await;
            Ok(Redirect::to(PRODUCTS_TAB))
        }
        Err(e) => {
            tracing::error!(product_id = %product.id, "Failed to create product: {e}");
            set_flash(&session, Flash::error(SAVE_FAILED)).await;
            Ok(Redirect::to(WIZARD_PATH))
        }
    }
}

/// Edit form.
///
/// GET /products/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<EditTemplate> {
    let product = state.backend().get_product(&ProductId::new(id)).await?;
    let drops = drop_options(&state).await;

    Ok(EditTemplate {
        admin_user: AdminView::from(&admin),
        current_path: format!("/products/{}/edit", product.id),
        form: ProductForm::from_product(&product),
        error: None,
        categories: category_options(),
        drops: drops.iter().map(DropOption::from).collect(),
        image_fields: image_fields(&product.images),
    })
}

/// Save an edited product. Colors and stock are kept as they were.
///
/// POST /products/{id}
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(mut form): Form<EditProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let existing = state.backend().get_product(&id).await?;

    form.product.id = id.to_string();
    let images = form.images();
    let product = form.product.to_product(images.clone(), Some(&existing));

    let error = match product.validate() {
        Err(e) => Some((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
        Ok(()) => match state.backend().update_product(&product).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(product_id = %id, "Failed to update product: {e}");
                Some((StatusCode::BAD_GATEWAY, SAVE_FAILED.to_string()))
            }
        },
    };

    if let Some((status, message)) = error {
        let drops = drop_options(&state).await;
        let page = EditTemplate {
            admin_user: AdminView::from(&admin),
            current_path: format!("/products/{id}/edit"),
            form: form.product,
            error: Some(message),
            categories: category_options(),
            drops: drops.iter().map(DropOption::from).collect(),
            image_fields: image_fields(&images),
        };
        return Ok((status, page).into_response());
    }

    tracing::info!(product_id = %id, "Product updated");
    set_flash(
        &session,
        Flash::success(format!("\"{}\" actualizado correctamente.", product.name)),
    )
    .await;
    Ok(Redirect::to(PRODUCTS_TAB).into_response())
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip(state, session, form))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let id = ProductId::new(id);
    let name = if form.name.trim().is_empty() {
        id.to_string()
    } else {
        form.name.trim().to_string()
    };

    let flash = match state.backend().delete_product(&id).await {
        Ok(()) | Err(BackendError::NotFound(_)) => {
            tracing::info!(product_id = %id, "Product deleted");
            Flash::success(format!("\"{name}\" eliminado."))
        }
        Err(e) => {
            tracing::error!(product_id = %id, "Failed to delete product: {e}");
            Flash::error(DELETE_FAILED)
        }
    };
    set_flash(&session, flash).await;
    Redirect::to(PRODUCTS_TAB)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::media::UploadedImage;

    use super::*;

    #[test]
    fn test_edit_form_images_skip_blanks() {
        let form = EditProductForm {
            product: ProductForm::default(),
            image_0: " https://cdn.test/a.jpg ".to_string(),
            image_1: String::new(),
            image_2: "https://cdn.test/c.jpg".to_string(),
            image_3: "  ".to_string(),
        };
        assert_eq!(
            form.images(),
            ["https://cdn.test/a.jpg", "https://cdn.test/c.jpg"]
        );
    }

    #[test]
    fn test_edit_form_deserializes_flattened_fields() {
        let form: EditProductForm = parse_form(
            "name=Boxy+Tee&cat=hoodies&drop=drop01&price=100&original_price=120&is_sale=on&image_0=https%3A%2F%2Fcdn.test%2Fa.jpg",
        );
        assert_eq!(form.product.name, "Boxy Tee");
        assert_eq!(form.product.cat, "hoodies");
        assert_eq!(form.product.is_sale.as_deref(), Some("on"));
        assert_eq!(form.product.is_new, None);
        assert_eq!(form.images(), ["https://cdn.test/a.jpg"]);
    }

    fn parse_form(body: &str) -> EditProductForm {
        let uri: axum::http::Uri = format!("/?{body}").parse().unwrap();
        Query::<EditProductForm>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_slot_views_reflect_state() {
        let mut images = ImageSlots::new(UploadKind::Product);
        images
            .set_done(
                0,
                UploadedImage {
                    url: "https://res.cloudinary.com/x/image/upload/v1/a.jpg".to_string(),
                    public_id: "blessed/a".to_string(),
                    width: 1,
                    height: 1,
                },
            )
            .unwrap();
        images.set_error(1).unwrap();

        let views = slot_views(&images);
        assert_eq!(views.len(), 4);
        let main = views.first().unwrap();
        assert_eq!(main.state, "done");
        assert!(main.required);
        assert_eq!(main.label, "Foto principal");
        let failed = views.get(1).unwrap();
        assert_eq!(failed.state, "error");
        assert_eq!(failed.error.as_deref(), Some(UPLOAD_FAILED));
    }

    #[test]
    fn test_review_summary_only_on_review_step() {
        let mut draft = ProductDraft::default();
        let page = WizardTemplate::new(
            AdminView {
                username: "admin".to_string(),
            },
            None,
            &draft,
            &[],
        );
        assert_eq!(page.step, "details");
        assert!(page.review.is_none());
        assert_eq!(page.categories.len(), 3);

        draft.step = UploadStep::Review;
        draft.form.name = "Boxy Tee".to_string();
        draft.form.price = "1000".to_string();
        let page = WizardTemplate::new(
            AdminView {
                username: "admin".to_string(),
            },
            None,
            &draft,
            &[],
        );
        let review = page.review.unwrap();
        assert_eq!(review.row.name, "Boxy Tee");
        assert_eq!(review.row.price, "$1.000");
    }
}
