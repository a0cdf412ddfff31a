//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use blessed_core::Product;
use blessed_core::catalog::SortOrder;
use blessed_core::drop::partition_by_active;
use chrono::Utc;
use tracing::instrument;

use super::catalog::{PRODUCTS_ERROR_MESSAGE, ProductCardView, product_cards};
use super::drops::DropView;
use crate::backend::ProductQuery;
use crate::filters;
use crate::state::AppState;

/// Number of products in the "Novedades" strip.
const FEATURED_COUNT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// First active drop, shown as the hero.
    pub hero: Option<DropView>,
    /// Remaining active drops.
    pub drops: Vec<DropView>,
    pub featured: Vec<ProductCardView>,
    pub error: Option<&'static str>,
}

/// Newest products first, limited to the featured strip.
fn featured(mut products: Vec<Product>) -> Vec<ProductCardView> {
    SortOrder::New.apply(&mut products);
    products.truncate(FEATURED_COUNT);
    product_cards(&products)
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.backend();
    let query = ProductQuery::default();
    let (drops, products) = tokio::join!(backend.get_drops(), backend.get_products(&query));

    let now = Utc::now();
    let mut drop_views = match drops {
        Ok(drops) => partition_by_active(&drops)
            .0
            .into_iter()
            .map(|drop| DropView::new(drop, now))
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to load drops for home page: {e}");
            Vec::new()
        }
    };
    let hero = (!drop_views.is_empty()).then(|| drop_views.remove(0));

    let (featured, error) = match products {
        Ok(products) => (featured(products), None),
        Err(e) => {
            tracing::error!("Failed to load featured products: {e}");
            (Vec::new(), Some(PRODUCTS_ERROR_MESSAGE))
        }
    };

    HomeTemplate {
        hero,
        drops: drop_views,
        featured,
        error,
    }
}
