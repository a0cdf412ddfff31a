//! Backend REST API client for the admin panel.
//!
//! Full CRUD over products and drops plus image uploads. Mutations carry the
//! configured bearer token. The unfiltered product and drop lists are cached
//! and patched in place after each successful mutation (see [`ListCache`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use blessed_admin::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend);
//! let drops = client.list_drops().await?;
//! client.update_drop(&drops[0].id, &DropUpdate::active(false)).await?;
//! ```

mod cache;
mod upload;

use std::sync::Arc;

use blessed_core::catalog::ProductQuery;
use blessed_core::media::{UploadKind, UploadedImage};
use blessed_core::{Drop, DropId, DropInput, DropUpdate, Product, ProductId};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{BackendConfig, bearer};

pub use cache::{ListCache, ListKey, ListValue};
pub use upload::{UPLOAD_CHUNK_SIZE, UploadFile, progress_stream};

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
/// Cheaply cloneable; clones share the HTTP connection pool and list cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    lists: ListCache,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_cache(config, ListCache::default())
    }

    /// Create a client with a specific list cache.
    #[must_use]
    pub fn with_cache(config: &BackendConfig, lists: ListCache) -> Self {
        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                token: config.api_token.clone(),
                lists,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach the bearer token, if configured.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.token {
            Some(token) => request.header(AUTHORIZATION, bearer(token)),
            None => request,
        }
    }

    /// The list cache, for inspection.
    #[must_use]
    pub fn lists(&self) -> &ListCache {
        &self.inner.lists
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List every product (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(products) = self.inner.lists.products().await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products = self.fetch_products(&ProductQuery::default()).await?;
        self.inner.lists.set_products(products.clone()).await;
        Ok(products)
    }

    /// List products narrowed to a drop or category. Filtered lists bypass
    /// the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        if query.is_unfiltered() {
            return self.list_products().await;
        }
        self.fetch_products(query).await
    }

    async fn fetch_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/products"))
            .query(&query.params())
            .send()
            .await?;
        read_json(response, "products").await
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown id, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(&product_path(id)))
            .send()
            .await?;
        read_json(response, &format!("product {id}")).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the product list cache is
    /// dropped in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn create_product(&self, product: &Product) -> Result<(), BackendError> {
        let request = self.inner.client.post(self.endpoint("/products")).json(product);
        self.mutate(request, ListKey::Products, "create product").await?;
        self.inner.lists.upsert_product(product.clone()).await;
        Ok(())
    }

    /// Replace a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the product list cache is
    /// dropped in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .put(self.endpoint(&product_path(&product.id)))
            .json(product);
        self.mutate(request, ListKey::Products, "update product").await?;
        self.inner.lists.upsert_product(product.clone()).await;
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the product list cache is
    /// dropped in that case.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError> {
        let request = self.inner.client.delete(self.endpoint(&product_path(id)));
        self.mutate(request, ListKey::Products, "delete product").await?;
        self.inner.lists.remove_product(id).await;
        Ok(())
    }

    // =========================================================================
    // Drops
    // =========================================================================

    /// List every drop (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_drops(&self) -> Result<Vec<Drop>, BackendError> {
        if let Some(drops) = self.inner.lists.drops().await {
            debug!("Cache hit for drop list");
            return Ok(drops);
        }

        let response = self.inner.client.get(self.endpoint("/drops")).send().await?;
        let drops: Vec<Drop> = read_json(response, "drops").await?;
        self.inner.lists.set_drops(drops.clone()).await;
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
        let response = self
            .inner
            .client
            .get(self.endpoint(&drop_path(id)))
            .send()
            .await?;
        read_json(response, &format!("drop {id}")).await
    }

    /// Create a drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the drop list cache is
    /// dropped in that case.
    #[instrument(skip(self, input), fields(drop_id = %input.id))]
    pub async fn create_drop(&self, input: &DropInput) -> Result<(), BackendError> {
        let request = self.inner.client.post(self.endpoint("/drops")).json(input);
        self.mutate(request, ListKey::Drops, "create drop").await?;
        self.inner.lists.upsert_drop(drop_from_input(input)).await;
        Ok(())
    }

    /// Partially update a drop. Only the fields set in `update` are sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the drop list cache is
    /// dropped in that case.
    #[instrument(skip(self, update), fields(drop_id = %id))]
    pub async fn update_drop(&self, id: &DropId, update: &DropUpdate) -> Result<(), BackendError> {
        let request = self.inner.client.put(self.endpoint(&drop_path(id))).json(update);
        self.mutate(request, ListKey::Drops, "update drop").await?;
        self.inner.lists.patch_drop(id, update).await;
        Ok(())
    }

    /// Delete a drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the drop list cache is
    /// dropped in that case.
    #[instrument(skip(self), fields(drop_id = %id))]
    pub async fn delete_drop(&self, id: &DropId) -> Result<(), BackendError> {
        let request = self.inner.client.delete(self.endpoint(&drop_path(id)));
        self.mutate(request, ListKey::Drops, "delete drop").await?;
        self.inner.lists.remove_drop(id).await;
        Ok(())
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Upload an image to the media host through the backend.
    ///
    /// The body is streamed in [`UPLOAD_CHUNK_SIZE`] chunks and `on_progress`
    /// receives the running percentage as each one is sent. There is no
    /// retry; a failure is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid, the request fails, or
    /// the response is malformed.
    #[instrument(skip(self, file, on_progress), fields(kind = %kind, size = file.bytes.len()))]
    pub async fn upload_image<F>(
        &self,
        kind: UploadKind,
        file: UploadFile,
        on_progress: F,
    ) -> Result<UploadedImage, BackendError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let length = file.bytes.len() as u64;
        let body = reqwest::Body::wrap_stream(progress_stream(file.bytes, on_progress));
        let part = Part::stream_with_length(body, length)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let request = self
            .inner
            .client
            .post(self.endpoint(&format!("/uploads/{kind}")))
            .multipart(form);
        let response = self.authorized(request).send().await?;
        read_json(response, "upload").await
    }

    /// Delete a previously uploaded image by its media-host id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, public_id: &str) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint("/uploads"))
            .query(&[("public_id", public_id)]);
        let response = self.authorized(request).send().await?;
        check_status(response, "image").await
    }

    /// Send an authorized mutation; on failure drop the affected list.
    async fn mutate(
        &self,
        request: reqwest::RequestBuilder,
        list: ListKey,
        what: &str,
    ) -> Result<(), BackendError> {
        let result = match self.authorized(request).send().await {
            Ok(response) => check_status(response, what).await,
            Err(e) => Err(e.into()),
        };
        if result.is_err() {
            self.inner.lists.invalidate(list).await;
        }
        result
    }
}

fn product_path(id: &ProductId) -> String {
    format!("/products/{}", urlencoding::encode(id.as_str()))
}

fn drop_path(id: &DropId) -> String {
    format!("/drops/{}", urlencoding::encode(id.as_str()))
}

/// Local copy of a created drop for the list cache.
fn drop_from_input(input: &DropInput) -> Drop {
    Drop {
        id: input.id.clone(),
        number: input.number.clone(),
        label: input.label.clone(),
        tagline: input.tagline.clone(),
        description: input.description.clone(),
        hero_image: input.hero_image.clone(),
        hero_image2: input.hero_image2.clone(),
        accent_color: input.accent_color.clone(),
        release_date: input.release_date.clone(),
        total_pieces: input.total_pieces,
        active: input.active,
        created_at: None,
    }
}

/// Map error statuses for responses whose body is not needed.
async fn check_status(response: reqwest::Response, what: &str) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(status_error(response, what).await)
}

async fn status_error(response: reqwest::Response, what: &str) -> BackendError {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return BackendError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return BackendError::NotFound(what.to_string());
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        what,
        "Backend API returned non-success status"
    );
    BackendError::Api {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    }
}

/// Decode a JSON response body, mapping error statuses.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, BackendError> {
    if !response.status().is_success() {
        return Err(status_error(response, what).await);
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}
