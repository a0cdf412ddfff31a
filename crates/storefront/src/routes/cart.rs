//! Cart route handlers.
//!
//! The cart lives in the session. Every mutation is a plain form POST that
//! redirects back to the cart page; `static/js/site.js` submits the same
//! forms with an `HX-Request` header and gets a fragment back instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use blessed_core::media::{Transform, transform_url};
use blessed_core::{Cart, CartLine, CartLineId, NewCartItem, ProductId, format_price};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::products::stock_color;
use crate::backend::BackendError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{CheckoutProgress, session_keys};
use crate::state::AppState;

const LINE_IMAGE: Transform<'static> = Transform::fill(200, 250);

/// Event name the header badge listens for.
const CART_UPDATED: &str = "cart-updated";

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session, empty if none.
pub(crate) async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
pub(crate) async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Load checkout progress from the session.
pub(crate) async fn load_progress(session: &Session) -> CheckoutProgress {
    session
        .get::<CheckoutProgress>(session_keys::CHECKOUT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store checkout progress in the session.
pub(crate) async fn save_progress(
    session: &Session,
    progress: &CheckoutProgress,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CHECKOUT, progress).await
}

/// Whether the request came from the enhancement script.
fn wants_fragment(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub product: String,
    pub size: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            product: line.product.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            price: format_price(line.price),
            line_total: format_price(line.line_total()),
            image: line.image.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub total: String,
    pub installments: Option<String>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            count: cart.count(),
            total: format_price(cart.total()),
            installments: cart.installments(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    pub color: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Fragment or redirect after a line mutation.
fn items_response(headers: &HeaderMap, cart: &Cart) -> Response {
    if wants_fragment(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartItemsTemplate {
                cart: CartView::from(cart),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        cart: CartView::from(&cart),
    }
}

/// Add one unit of a product variant.
///
/// The product is looked up so price and image come from the backend rather
/// than the form, and so sold-out sizes are rejected.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let product = match state.backend().get_product(&id).await {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    let color = form
        .color
        .filter(|c| !c.is_empty() && product.has_color(c));
    let size = form.size.trim().to_string();
    if !size.is_empty() && !product.is_size_available(&size, stock_color(&product, color.as_deref())) {
        return Err(AppError::BadRequest("Ese talle no tiene stock.".to_string()));
    }

    let mut cart = load_cart(&session).await;
    cart.add(NewCartItem {
        product: product.name.clone(),
        price: product.price,
        size,
        color,
        image: product
            .primary_image()
            .map(|url| transform_url(url, LINE_IMAGE)),
    })?;
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product", id.as_str())][..]));

    if wants_fragment(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartCountTemplate {
                count: cart.count(),
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Set a line's quantity. Zero or less removes it.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.update_quantity(&CartLineId::new(form.line_id), form.quantity)?;
    save_cart(&session, &cart).await?;
    Ok(items_response(&headers, &cart))
}

/// Remove a line.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.remove(&CartLineId::new(form.line_id))?;
    save_cart(&session, &cart).await?;
    Ok(items_response(&headers, &cart))
}

/// Cart count badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartCountTemplate {
        count: cart.count(),
    }
}
