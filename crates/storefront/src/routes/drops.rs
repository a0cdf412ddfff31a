//! Drop landing pages.
//!
//! Released drops list their products with the same sort and grid controls as
//! the catalog. Unreleased drops show a coming-soon page with a countdown that
//! `static/js/countdown.js` keeps ticking client-side.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use blessed_core::catalog::{CatalogFilter, drop_page_filter_options, drop_route};
use blessed_core::countdown::{TimeLeft, format_release_date};
use blessed_core::media::{Transform, transform_url};
use blessed_core::{Drop, DropId};
use chrono::{DateTime, Utc};
use tracing::instrument;

use super::catalog::{
    FilterChipView, GridToggleView, ListingQuery, PRODUCTS_ERROR_MESSAGE, ProductCardView,
    SortOptionView, grid_toggle, product_cards, sort_options,
};
use crate::backend::{BackendError, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

const HERO_IMAGE: Transform<'static> = Transform::fill(1600, 900);

/// Drop display data for templates.
#[derive(Clone)]
pub struct DropView {
    pub id: String,
    pub href: String,
    pub number: String,
    pub label: String,
    pub tagline: String,
    pub description: String,
    pub hero_image: String,
    pub hero_image2: Option<String>,
    pub accent_color: String,
    pub release_label: String,
    pub total_pieces: u32,
    pub coming_soon: bool,
}

impl DropView {
    /// Build the view as of `now`.
    #[must_use]
    pub fn new(drop: &Drop, now: DateTime<Utc>) -> Self {
        Self {
            id: drop.id.to_string(),
            href: drop.path(),
            number: drop.number.clone(),
            label: drop.label.clone(),
            tagline: drop.tagline.clone(),
            description: drop.description.clone(),
            hero_image: transform_url(&drop.hero_image, HERO_IMAGE),
            hero_image2: drop
                .hero_image2
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| transform_url(url, HERO_IMAGE)),
            accent_color: drop.accent_color.clone(),
            release_label: format_release_date(&drop.release_date),
            total_pieces: drop.total_pieces,
            coming_soon: !drop.is_released(now),
        }
    }
}

/// One countdown unit.
#[derive(Clone)]
pub struct CountdownUnit {
    pub value: String,
    pub label: &'static str,
}

/// Countdown display data; `release_at` feeds the client-side ticker.
#[derive(Clone)]
pub struct CountdownView {
    pub release_at: String,
    pub units: Vec<CountdownUnit>,
}

impl CountdownView {
    fn new(release: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let [days, hours, minutes, seconds] = TimeLeft::until(release, now).padded();
        Self {
            release_at: release.to_rfc3339(),
            units: vec![
                CountdownUnit {
                    value: days,
                    label: "días",
                },
                CountdownUnit {
                    value: hours,
                    label: "horas",
                },
                CountdownUnit {
                    value: minutes,
                    label: "min",
                },
                CountdownUnit {
                    value: seconds,
                    label: "seg",
                },
            ],
        }
    }
}

/// Released drop landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "drops/show.html")]
pub struct DropShowTemplate {
    pub drop: DropView,
    pub products: Vec<ProductCardView>,
    pub chips: Vec<FilterChipView>,
    pub sort_options: Vec<SortOptionView>,
    pub grid: GridToggleView,
    pub error: Option<&'static str>,
}

/// Coming-soon page template.
#[derive(Template, WebTemplate)]
#[template(path = "drops/coming_soon.html")]
pub struct DropComingSoonTemplate {
    pub drop: DropView,
    pub countdown: CountdownView,
}

fn drop_chips(drops: &[Drop], current: &DropId) -> Vec<FilterChipView> {
    drop_page_filter_options(drops)
        .into_iter()
        .map(|option| FilterChipView {
            href: drop_route(&CatalogFilter::parse(&option.value, drops)),
            active: option.value == current.as_str(),
            label: option.label,
        })
        .collect()
}

/// Display a drop landing page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let id = DropId::new(id);
    let drop = match state.backend().get_drop(&id).await {
        Ok(drop) => drop,
        Err(BackendError::NotFound(_)) => return Err(AppError::NotFound(format!("drop {id}"))),
        Err(e) => return Err(e.into()),
    };

    let now = Utc::now();
    let view = DropView::new(&drop, now);

    if let Some(release) = drop.release_at().filter(|at| *at > now) {
        return Ok(DropComingSoonTemplate {
            drop: view,
            countdown: CountdownView::new(release, now),
        }
        .into_response());
    }

    let drops = state.backend().get_drops().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load drops for drop page filters: {e}");
        Vec::new()
    });

    let sort = query.sort();
    let grid = query.view();
    let (products, error) = match state
        .backend()
        .get_products(&ProductQuery::for_drop(id.clone()))
        .await
    {
        Ok(mut products) => {
            // Backend may ignore the drop parameter
            products.retain(|p| p.drop == id);
            sort.apply(&mut products);
            (product_cards(&products), None)
        }
        Err(e) => {
            tracing::error!("Failed to load drop products: {e}");
            (Vec::new(), Some(PRODUCTS_ERROR_MESSAGE))
        }
    };

    let path = drop.path();
    Ok(DropShowTemplate {
        drop: view,
        products,
        chips: drop_chips(&drops, &id),
        sort_options: sort_options(&path, None, sort, grid),
        grid: grid_toggle(&path, None, sort, grid),
        error,
    }
    .into_response())
}
