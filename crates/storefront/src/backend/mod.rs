//! Backend REST API client for the storefront.
//!
//! Read-only access to products and drops plus checkout preference creation.
//! Catalog reads are cached with `moka` (5-minute TTL); checkout is never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use blessed_storefront::backend::{BackendClient, ProductQuery};
//!
//! let client = BackendClient::new(&config.backend);
//! let products = client.get_products(&ProductQuery::default()).await?;
//! let drop = client.get_drop(&DropId::new("drop02")).await?;
//! ```

mod cache;

use std::sync::Arc;
use std::time::Duration;

use blessed_core::checkout::{CheckoutRequest, CheckoutResponse};
use blessed_core::{Drop, DropId, Product, ProductId};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::BackendConfig;

pub use blessed_core::catalog::ProductQuery;
pub use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Client for the backend REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// List products, optionally narrowed to a drop or category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let cache_key = CacheKey::products(query);

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(self.endpoint("/products"))
            .query(&query.params())
            .send()
            .await?;
        let products: Vec<Product> = read_json(response, "products").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown id, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let response = self.inner.client.get(self.endpoint(&path)).send().await?;
        let product: Product = read_json(response, &format!("product {id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_drops(&self) -> Result<Vec<Drop>, BackendError> {
        if let Some(CacheValue::Drops(drops)) = self.inner.cache.get(&CacheKey::Drops).await {
            debug!("Cache hit for drops");
            return Ok(drops);
        }

        let response = self.inner.client.get(self.endpoint("/drops")).send().await?;
        let drops: Vec<Drop> = read_json(response, "drops").await?;

        self.inner
            .cache
            .insert(CacheKey::Drops, CacheValue::Drops(drops.clone()))
            .await;

        Ok(drops)
    }

    /// Get a single drop.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown id, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(drop_id = %id))]
    pub async fn get_drop(&self, id: &DropId) -> Result<Drop, BackendError> {
        let cache_key = CacheKey::Drop(id.clone());

        if let Some(CacheValue::Drop(drop)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for drop");
            return Ok(*drop);
        }

        let path = format!("/drops/{}", urlencoding::encode(id.as_str()));
        let response = self.inner.client.get(self.endpoint(&path)).send().await?;
        let drop: Drop = read_json(response, &format!("drop {id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Drop(Box::new(drop.clone())))
            .await;

        Ok(drop)
    }

    /// Create a payment preference for the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is malformed.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, BackendError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/checkout"))
            .json(request)
            .send()
            .await?;
        read_json(response, "checkout").await
    }
}

/// Decode a JSON response body, mapping error statuses.
///
/// The body is read as text first so failures can be logged.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, BackendError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(what.to_string()));
    }

    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend API returned non-success status"
        );
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}
