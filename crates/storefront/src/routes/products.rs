//! Product detail route handler.
//!
//! The page is fully server-rendered: the selected color and the gallery
//! position travel in the query string (`?color=Negro&image=2`), so swatches
//! and gallery arrows are plain links.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use blessed_core::media::{Transform, transform_url};
use blessed_core::product::SIZES;
use blessed_core::{Category, Product, ProductId, format_price, installment_hint};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

const GALLERY_IMAGE: Transform<'static> = Transform::fill(1000, 1250);
const THUMBNAIL_IMAGE: Transform<'static> = Transform::fill(160, 200);

/// Product detail query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub color: Option<String>,
    pub image: Option<usize>,
}

/// The color to check stock against.
///
/// Stock entries without colors apply to every color, so the selection only
/// narrows the lookup when the product tracks stock per color.
pub(crate) fn stock_color<'a>(product: &Product, selected: Option<&'a str>) -> Option<&'a str> {
    selected.filter(|_| product.stock.iter().any(|s| s.color.is_some()))
}

/// A color swatch link.
#[derive(Clone)]
pub struct SwatchView {
    pub name: String,
    pub hex: String,
    pub href: String,
    pub active: bool,
}

/// A size button.
#[derive(Clone)]
pub struct SizeView {
    pub label: &'static str,
    pub available: bool,
}

/// A gallery thumbnail link.
#[derive(Clone)]
pub struct ThumbnailView {
    pub url: String,
    pub href: String,
    pub active: bool,
}

/// Image gallery with wrap-around navigation.
#[derive(Clone)]
pub struct GalleryView {
    pub current: Option<String>,
    pub thumbnails: Vec<ThumbnailView>,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    /// 1-based position for the "2 / 4" counter.
    pub position: usize,
    pub total: usize,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_badge: Option<String>,
    pub is_new: bool,
    pub installments: String,
    pub selected_color: Option<String>,
    pub swatches: Vec<SwatchView>,
    pub sizes: Vec<SizeView>,
    pub sold_out: bool,
    pub gallery: GalleryView,
}

fn detail_href(product: &Product, color: Option<&str>, image: usize) -> String {
    let mut href = format!("/product/{}", urlencoding::encode(product.id.as_str()));
    let mut sep = '?';
    if let Some(color) = color {
        href.push_str(&format!("{sep}color={}", urlencoding::encode(color)));
        sep = '&';
    }
    if image > 0 {
        href.push_str(&format!("{sep}image={image}"));
    }
    href
}

fn gallery(product: &Product, color: Option<&str>, requested: usize) -> GalleryView {
    let total = product.images.len();
    if total == 0 {
        return GalleryView {
            current: None,
            thumbnails: Vec::new(),
            prev_href: None,
            next_href: None,
            position: 0,
            total: 0,
        };
    }

    let active = requested.min(total - 1);
    let thumbnails = product
        .images
        .iter()
        .enumerate()
        .map(|(i, url)| ThumbnailView {
            url: transform_url(url, THUMBNAIL_IMAGE),
            href: detail_href(product, color, i),
            active: i == active,
        })
        .collect();

    let (prev_href, next_href) = if total > 1 {
        (
            Some(detail_href(product, color, (active + total - 1) % total)),
            Some(detail_href(product, color, (active + 1) % total)),
        )
    } else {
        (None, None)
    };

    GalleryView {
        current: product
            .images
            .get(active)
            .map(|url| transform_url(url, GALLERY_IMAGE)),
        thumbnails,
        prev_href,
        next_href,
        position: active + 1,
        total,
    }
}

impl ProductDetailView {
    /// Build the view for the requested color and gallery position.
    ///
    /// Unknown colors fall back to the product's first color.
    #[must_use]
    pub fn new(product: &Product, query: &ProductQuery) -> Self {
        let selected = query
            .color
            .as_deref()
            .filter(|c| product.has_color(c))
            .or_else(|| product.default_color());
        let lookup = stock_color(product, selected);

        let sizes: Vec<SizeView> = SIZES
            .into_iter()
            .map(|label| SizeView {
                label,
                available: product.is_size_available(label, lookup),
            })
            .collect();

        let discount = product.discount_percent();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: Category::from_slug(&product.cat)
                .map_or_else(|| product.cat.clone(), |c| c.label().to_string()),
            description: product.description.clone().filter(|d| !d.trim().is_empty()),
            price: format_price(product.price),
            original_price: (discount > 0).then(|| format_price(product.original_price)),
            discount_badge: (product.is_sale && discount > 0).then(|| format!("-{discount}%")),
            is_new: product.is_new,
            installments: installment_hint(product.price),
            selected_color: selected.map(str::to_string),
            swatches: product
                .colors
                .iter()
                .map(|c| SwatchView {
                    name: c.name.clone(),
                    hex: c.hex.clone(),
                    href: detail_href(product, Some(&c.name), 0),
                    active: Some(c.name.as_str()) == selected,
                })
                .collect(),
            sold_out: sizes.iter().all(|s| !s.available),
            sizes,
            gallery: gallery(product, selected, query.image.unwrap_or(0)),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = match state.backend().get_product(&id).await {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ProductShowTemplate {
        product: ProductDetailView::new(&product, &query),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::{DropId, ProductColor, ProductStock};
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("hoodie-01"),
            cat: "hoodies".to_string(),
            drop: DropId::new("drop01"),
            name: "Heavy Hoodie".to_string(),
            price: Decimal::from(90_000),
            original_price: Decimal::from(90_000),
            is_new: false,
            is_sale: false,
            images: vec![
                "https://cdn.test/1.jpg".to_string(),
                "https://cdn.test/2.jpg".to_string(),
                "https://cdn.test/3.jpg".to_string(),
            ],
            description: Some("Frisa pesada".to_string()),
            colors: vec![
                ProductColor {
                    name: "Negro".to_string(),
                    hex: "#000000".to_string(),
                },
                ProductColor {
                    name: "Gris Melange".to_string(),
                    hex: "#9a9a9a".to_string(),
                },
            ],
            stock: vec![
                ProductStock {
                    size: "M".to_string(),
                    color: Some("Negro".to_string()),
                    stock: 3,
                },
                ProductStock {
                    size: "L".to_string(),
                    color: Some("Gris Melange".to_string()),
                    stock: 1,
                },
            ],
        }
    }

    fn available(view: &ProductDetailView) -> Vec<&str> {
        view.sizes
            .iter()
            .filter(|s| s.available)
            .map(|s| s.label)
            .collect()
    }

    #[test]
    fn test_default_color_selected() {
        let view = ProductDetailView::new(&product(), &ProductQuery::default());
        assert_eq!(view.selected_color.as_deref(), Some("Negro"));
        assert_eq!(available(&view), ["M"]);
        assert!(!view.sold_out);
    }

    #[test]
    fn test_color_changes_availability() {
        let query = ProductQuery {
            color: Some("Gris Melange".to_string()),
            image: None,
        };
        let view = ProductDetailView::new(&product(), &query);
        assert_eq!(available(&view), ["L"]);
        assert!(view.swatches.get(1).is_some_and(|s| s.active));
        assert_eq!(
            view.swatches.first().unwrap().href,
            "/product/hoodie-01?color=Negro"
        );
    }

    #[test]
    fn test_unknown_color_falls_back() {
        let query = ProductQuery {
            color: Some("Rosa".to_string()),
            image: None,
        };
        let view = ProductDetailView::new(&product(), &query);
        assert_eq!(view.selected_color.as_deref(), Some("Negro"));
    }

    #[test]
    fn test_colorless_stock_ignores_selection() {
        let mut product = product();
        for entry in &mut product.stock {
            entry.color = None;
        }
        let view = ProductDetailView::new(&product, &ProductQuery::default());
        assert_eq!(available(&view), ["M", "L"]);
        assert_eq!(stock_color(&product, Some("Negro")), None);
    }

    #[test]
    fn test_gallery_wraps_and_clamps() {
        let query = ProductQuery {
            color: None,
            image: Some(9),
        };
        let view = ProductDetailView::new(&product(), &query);
        assert_eq!(view.gallery.position, 3);
        assert_eq!(view.gallery.total, 3);
        assert_eq!(
            view.gallery.next_href.as_deref(),
            Some("/product/hoodie-01?color=Negro")
        );
        assert_eq!(
            view.gallery.prev_href.as_deref(),
            Some("/product/hoodie-01?color=Negro&image=1")
        );
    }

    #[test]
    fn test_sold_out_without_stock() {
        let mut product = product();
        product.stock.clear();
        let view = ProductDetailView::new(&product, &ProductQuery::default());
        assert!(view.sold_out);
    }
}
