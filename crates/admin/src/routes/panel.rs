//! Admin panel: product and drop tabs with counts.
//!
//! Both lists come from the backend client's list cache, so switching tabs
//! or searching does not hit the backend again within the cache TTL.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use blessed_core::drop::partition_by_active;
use blessed_core::media::{Transform, transform_url};
use blessed_core::{Category, Drop, Product, format_price};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminView, take_flash};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;

const THUMBNAIL: Transform<'static> = Transform::fill(120, 150);

pub(crate) const PRODUCTS_LOAD_ERROR: &str = "No se pudieron cargar los productos.";
pub(crate) const DROPS_LOAD_ERROR: &str = "No se pudieron cargar los drops.";

/// Panel tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelTab {
    #[default]
    Products,
    Drops,
}

impl PanelTab {
    #[must_use]
    pub const fn is_products(self) -> bool {
        matches!(self, Self::Products)
    }
}

/// Panel query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PanelQuery {
    #[serde(default)]
    pub tab: PanelTab,
    #[serde(default)]
    pub q: String,
}

/// Product row in the admin list.
#[derive(Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub drop: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: u32,
    pub is_new: bool,
    pub thumbnail: Option<String>,
    pub image_count: usize,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        let discount = if product.is_sale {
            product.discount_percent()
        } else {
            0
        };
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: Category::from_slug(&product.cat)
                .map_or_else(|| product.cat.clone(), |c| c.label().to_string()),
            drop: product.drop.to_string(),
            price: format_price(product.price),
            original_price: (discount > 0).then(|| format_price(product.original_price)),
            discount,
            is_new: product.is_new,
            thumbnail: product.primary_image().map(|url| transform_url(url, THUMBNAIL)),
            image_count: product.images.len(),
        }
    }
}

/// Drop row in the admin list.
#[derive(Clone)]
pub struct DropRow {
    pub id: String,
    pub number: String,
    pub label: String,
    pub tagline: String,
    pub release_date: String,
    pub accent_color: String,
    pub total_pieces: u32,
    pub active: bool,
    pub thumbnail: Option<String>,
}

impl From<&Drop> for DropRow {
    fn from(drop: &Drop) -> Self {
        Self {
            id: drop.id.to_string(),
            number: drop.number.clone(),
            label: drop.label.clone(),
            tagline: drop.tagline.clone(),
            release_date: drop.release_date.clone(),
            accent_color: drop.accent_color.clone(),
            total_pieces: drop.total_pieces,
            active: drop.active,
            thumbnail: (!drop.hero_image.is_empty())
                .then(|| transform_url(&drop.hero_image, THUMBNAIL)),
        }
    }
}

/// Products matching a search, as rows.
#[must_use]
pub fn product_rows(products: &[Product], q: &str) -> Vec<ProductRow> {
    products
        .iter()
        .filter(|p| p.matches_search(q))
        .map(ProductRow::from)
        .collect()
}

/// Drops split into (active, inactive) rows.
#[must_use]
pub fn drop_rows(drops: &[Drop]) -> (Vec<DropRow>, Vec<DropRow>) {
    let (active, inactive) = partition_by_active(drops);
    (
        active.into_iter().map(DropRow::from).collect(),
        inactive.into_iter().map(DropRow::from).collect(),
    )
}

/// Product list fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_list.html")]
pub struct ProductListTemplate {
    pub products: Vec<ProductRow>,
    pub q: String,
    pub load_error: Option<&'static str>,
}

/// Drop list fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/drop_list.html")]
pub struct DropListTemplate {
    pub active_drops: Vec<DropRow>,
    pub inactive_drops: Vec<DropRow>,
    pub load_error: Option<&'static str>,
}

/// Panel page template.
#[derive(Template, WebTemplate)]
#[template(path = "panel.html")]
pub struct PanelTemplate {
    pub admin_user: AdminView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub tab: PanelTab,
    pub product_count: usize,
    pub drop_count: usize,
    pub active_drop_count: usize,
    pub product_list: ProductListTemplate,
    pub drop_list: DropListTemplate,
}

/// Render the panel.
///
/// GET /
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    let backend = state.backend();
    let (products, drops) = tokio::join!(backend.list_products(), backend.list_drops());

    let (products, products_error) = match products {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::error!("Failed to load products: {e}");
            (Vec::new(), Some(PRODUCTS_LOAD_ERROR))
        }
    };
    let (drops, drops_error) = match drops {
        Ok(drops) => (drops, None),
        Err(e) => {
            tracing::error!("Failed to load drops: {e}");
            (Vec::new(), Some(DROPS_LOAD_ERROR))
        }
    };

    let (active_drops, inactive_drops) = drop_rows(&drops);

    PanelTemplate {
        admin_user: AdminView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        tab: query.tab,
        product_count: products.len(),
        drop_count: drops.len(),
        active_drop_count: active_drops.len(),
        product_list: ProductListTemplate {
            products: product_rows(&products, &query.q),
            q: query.q.trim().to_string(),
            load_error: products_error,
        },
        drop_list: DropListTemplate {
            active_drops,
            inactive_drops,
            load_error: drops_error,
        },
    }
}
