//! Catalog route handler and the product card views shared by listing pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use blessed_core::catalog::{CatalogFilter, GridView, SortOrder, filter_options, visible_products};
use blessed_core::media::{Transform, transform_url};
use blessed_core::{Category, Drop, Product, format_price, installment_hint};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::ProductQuery;
use crate::filters;
use crate::state::AppState;

/// Message shown when the product list cannot be loaded.
pub const PRODUCTS_ERROR_MESSAGE: &str = "No se pudieron cargar los productos.";

/// Card image size in the product grids.
const CARD_IMAGE: Transform<'static> = Transform::fill(600, 750);

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub hover_image: Option<String>,
    pub price: String,
    pub original_price: Option<String>,
    /// e.g. `-30%`, only for products marked as sale.
    pub discount_badge: Option<String>,
    pub is_new: bool,
    pub installments: String,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let discount = product.discount_percent();
        let sale_discount = product.sale_discount();
        Self {
            id: product.id.to_string(),
            href: format!("/product/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            category: Category::from_slug(&product.cat)
                .map_or_else(|| product.cat.clone(), |c| c.label().to_string()),
            image: product
                .primary_image()
                .map(|url| transform_url(url, CARD_IMAGE)),
            hover_image: product
                .images
                .get(1)
                .map(|url| transform_url(url, CARD_IMAGE)),
            price: format_price(product.price),
            original_price: (discount > 0).then(|| format_price(product.original_price)),
            discount_badge: (sale_discount > 0).then(|| format!("-{sale_discount}%")),
            is_new: product.is_new,
            installments: installment_hint(product.price),
        }
    }
}

/// Convert a product list to cards.
#[must_use]
pub fn product_cards(products: &[Product]) -> Vec<ProductCardView> {
    products.iter().map(ProductCardView::from).collect()
}

/// A filter chip.
#[derive(Clone)]
pub struct FilterChipView {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// A sort dropdown entry.
#[derive(Clone)]
pub struct SortOptionView {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Grid density toggle links.
#[derive(Clone)]
pub struct GridToggleView {
    pub two_col_href: String,
    pub four_col_href: String,
    pub two_col: bool,
}

/// Catalog and drop page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub view: Option<String>,
}

impl ListingQuery {
    /// Sort order, falling back to the default for unknown values.
    #[must_use]
    pub fn sort(&self) -> SortOrder {
        self.sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Grid view, falling back to the default for unknown values.
    #[must_use]
    pub fn view(&self) -> GridView {
        self.view
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Build a listing URL preserving filter, sort and view.
#[must_use]
pub fn listing_href(path: &str, filter: Option<&str>, sort: SortOrder, view: GridView) -> String {
    let mut params = Vec::with_capacity(3);
    if let Some(filter) = filter.filter(|f| *f != "all") {
        params.push(format!("filter={}", urlencoding::encode(filter)));
    }
    if sort != SortOrder::default() {
        params.push(format!("sort={}", sort.value()));
    }
    if view != GridView::default() {
        params.push(format!("view={}", view.value()));
    }
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", params.join("&"))
    }
}

/// Sort entries linking to `path` with the current filter and view kept.
#[must_use]
pub fn sort_options(
    path: &str,
    filter: Option<&str>,
    current: SortOrder,
    view: GridView,
) -> Vec<SortOptionView> {
    SortOrder::ALL
        .into_iter()
        .map(|order| SortOptionView {
            label: order.label(),
            href: listing_href(path, filter, order, view),
            active: order == current,
        })
        .collect()
}

/// Grid toggle links for `path`.
#[must_use]
pub fn grid_toggle(path: &str, filter: Option<&str>, sort: SortOrder, view: GridView) -> GridToggleView {
    GridToggleView {
        two_col_href: listing_href(path, filter, sort, GridView::TwoCol),
        four_col_href: listing_href(path, filter, sort, GridView::FourCol),
        two_col: view == GridView::TwoCol,
    }
}

fn catalog_chips(
    drops: &[Drop],
    current: &CatalogFilter,
    sort: SortOrder,
    view: GridView,
) -> Vec<FilterChipView> {
    filter_options(drops)
        .into_iter()
        .map(|option| {
            let href = CatalogFilter::parse(&option.value, drops)
                .route()
                .unwrap_or_else(|| listing_href("/catalog", Some(&option.value), sort, view));
            FilterChipView {
                active: option.value == current.value(),
                label: option.label,
                href,
            }
        })
        .collect()
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub products: Vec<ProductCardView>,
    pub chips: Vec<FilterChipView>,
    pub sort_options: Vec<SortOptionView>,
    pub grid: GridToggleView,
    pub result_count: usize,
    pub error: Option<&'static str>,
}

/// Display the catalog.
///
/// A drop filter redirects to that drop's landing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<ListingQuery>) -> Response {
    let sort = query.sort();
    let view = query.view();

    let drops = match state.backend().get_drops().await {
        Ok(drops) => drops,
        Err(e) => {
            tracing::warn!("Failed to load drops for catalog filters: {e}");
            Vec::new()
        }
    };

    let filter = CatalogFilter::parse(query.filter.as_deref().unwrap_or("all"), &drops);
    if let Some(route) = filter.route() {
        return Redirect::to(&route).into_response();
    }

    let backend_query = match &filter {
        CatalogFilter::Category(slug) => ProductQuery {
            drop: None,
            cat: Some(slug.clone()),
        },
        _ => ProductQuery::default(),
    };

    let (products, error) = match state.backend().get_products(&backend_query).await {
        Ok(products) => (visible_products(&products, &filter, sort), None),
        Err(e) => {
            tracing::error!("Failed to load catalog products: {e}");
            (Vec::new(), Some(PRODUCTS_ERROR_MESSAGE))
        }
    };

    let filter_value = filter.value().to_string();
    CatalogTemplate {
        result_count: products.len(),
        products: product_cards(&products),
        chips: catalog_chips(&drops, &filter, sort, view),
        sort_options: sort_options("/catalog", Some(&filter_value), sort, view),
        grid: grid_toggle("/catalog", Some(&filter_value), sort, view),
        error,
    }
    .into_response()
}
