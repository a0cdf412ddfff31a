//! Integration tests for Blessed.
//!
//! Each test starts an in-process mock of the backend REST API on an
//! ephemeral port, then the storefront or admin app pointed at it, and
//! drives the app over real HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p blessed-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_flow` - Cart and checkout through the storefront
//! - `admin_flow` - Login, drop and product management through the admin
//! - `backend_client` - Admin backend client against the mock API

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use blessed_core::catalog::ProductQuery;
use blessed_core::media::UploadedImage;
use blessed_core::{Drop, DropId, DropUpdate, Product, ProductColor, ProductId, ProductStock};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Bearer token the mock accepts for mutations.
pub const BACKEND_TOKEN: &str = "k7Qm2Vx9Rt4Bn8Lp3Zw6Hc1Jd5Fy0Gs";

/// Admin login used by [`admin_config`].
pub const ADMIN_USERNAME: &str = "blessed";
pub const ADMIN_PASSWORD: &str = "tres-cuotas-sin-interes";

/// Where the mock says the buyer should pay.
pub const SANDBOX_PAYMENT_URL: &str = "https://sandbox.pagos.test/checkout?pref=pref-1";

/// One file the mock received on `/uploads/{kind}`.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub kind: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// Everything the mock backend holds or has been sent.
#[derive(Debug, Default)]
pub struct MockData {
    pub products: Vec<Product>,
    pub drops: Vec<Drop>,
    pub checkouts: Vec<Value>,
    pub uploads: Vec<ReceivedUpload>,
    pub deleted_images: Vec<String>,
    pub rejected_mutations: usize,
    /// Answer `/checkout` with a 500.
    pub fail_checkout: bool,
}

/// In-process stand-in for the backend REST API.
#[derive(Clone, Default)]
pub struct MockBackend {
    data: Arc<Mutex<MockData>>,
}

impl MockBackend {
    /// A backend seeded with the given catalog.
    #[must_use]
    pub fn with_catalog(drops: Vec<Drop>, products: Vec<Product>) -> Self {
        let backend = Self::default();
        {
            let mut data = backend.data();
            data.drops = drops;
            data.products = products;
        }
        backend
    }

    /// Lock the shared data for inspection or setup.
    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn router(self) -> Router {
        Router::new()
            .route("/products", get(list_products).post(create_product))
            .route(
                "/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/drops", get(list_drops).post(create_drop))
            .route(
                "/drops/{id}",
                get(get_drop).put(update_drop).delete(delete_drop),
            )
            .route("/checkout", post(create_checkout))
            .route("/uploads/{kind}", post(upload))
            .route("/uploads", axum::routing::delete(delete_upload))
            .with_state(self)
    }

    /// Serve the mock and return its base URL.
    pub async fn start(&self) -> String {
        let addr = serve(self.clone().router()).await;
        format!("http://{addr}")
    }
}

/// Serve a router on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });
    addr
}

/// A browser-like client: keeps cookies, does not follow redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("build client")
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

// =============================================================================
// App Setup
// =============================================================================

/// Storefront configuration against a backend URL.
#[must_use]
pub fn storefront_config(backend_url: &str) -> blessed_storefront::config::StorefrontConfig {
    blessed_storefront::config::StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        backend: blessed_storefront::config::BackendConfig::new(backend_url)
            .expect("backend url"),
        payment_sandbox: true,
        media_origin: "https://res.cloudinary.com".to_owned(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Start the storefront against a backend URL and return its base URL.
pub async fn start_storefront(backend_url: &str) -> String {
    let state = blessed_storefront::state::AppState::new(storefront_config(backend_url));
    let addr = serve(blessed_storefront::app(state)).await;
    format!("http://{addr}")
}

/// Admin configuration against a backend URL, logging in with
/// [`ADMIN_USERNAME`] / [`ADMIN_PASSWORD`].
#[must_use]
pub fn admin_config(backend_url: &str) -> blessed_admin::config::AdminConfig {
    let hash = blessed_admin::services::hash_password(ADMIN_PASSWORD).expect("hash password");
    blessed_admin::config::AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3001".to_owned(),
        backend: blessed_admin::config::BackendConfig::new(
            backend_url,
            Some(BACKEND_TOKEN.to_owned()),
        )
        .expect("backend config"),
        credentials: blessed_admin::config::AdminCredentials::new(ADMIN_USERNAME, hash)
            .expect("credentials"),
        media_origin: "https://res.cloudinary.com".to_owned(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Start the admin against a backend URL and return its base URL.
pub async fn start_admin(backend_url: &str) -> String {
    let state = blessed_admin::state::AppState::new(admin_config(backend_url));
    let addr = serve(blessed_admin::app(state)).await;
    format!("http://{addr}")
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn sample_drop(number: &str, active: bool) -> Drop {
    Drop {
        id: Drop::id_for_number(number),
        number: number.to_owned(),
        label: format!("Drop {number}"),
        tagline: "Cápsula de invierno".to_owned(),
        description: "Prendas pesadas, tiradas cortas.".to_owned(),
        hero_image: "https://res.cloudinary.com/blessed/image/upload/v1/hero.jpg".to_owned(),
        hero_image2: None,
        accent_color: "#e8e4dc".to_owned(),
        release_date: "2025-05-01T18:00:00Z".to_owned(),
        total_pieces: 120,
        active,
        created_at: None,
    }
}

#[must_use]
pub fn sample_product(id: &str, drop: &DropId) -> Product {
    Product {
        id: ProductId::new(id),
        cat: "tshirts".to_owned(),
        drop: drop.clone(),
        name: "Boxy Tee Negra".to_owned(),
        price: Decimal::from(51_000),
        original_price: Decimal::from(60_000),
        is_new: true,
        is_sale: true,
        images: vec![
            "https://res.cloudinary.com/blessed/image/upload/v1/tee.jpg".to_owned(),
        ],
        description: None,
        colors: vec![ProductColor {
            name: "Negro".to_owned(),
            hex: "#111111".to_owned(),
        }],
        stock: vec![
            ProductStock {
                size: "M".to_owned(),
                color: None,
                stock: 3,
            },
            ProductStock {
                size: "L".to_owned(),
                color: None,
                stock: 0,
            },
        ],
    }
}

// =============================================================================
// Mock Handlers
// =============================================================================

fn authorized(backend: &MockBackend, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {BACKEND_TOKEN}");
    let ok = headers
        .get(AUTHORIZATION)
        .is_some_and(|v| v.as_bytes() == expected.as_bytes());
    if !ok {
        backend.data().rejected_mutations += 1;
    }
    ok
}

#[derive(Debug, Deserialize)]
struct ListParams {
    drop: Option<String>,
    cat: Option<String>,
}

async fn list_products(
    State(backend): State<MockBackend>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Product>> {
    let query = ProductQuery {
        drop: params.drop.map(DropId::new),
        cat: params.cat,
    };
    let products = backend
        .data()
        .products
        .iter()
        .filter(|p| query.drop.as_ref().is_none_or(|d| &p.drop == d))
        .filter(|p| query.cat.as_deref().is_none_or(|c| p.cat == c))
        .cloned()
        .collect();
    Json(products)
}

async fn get_product(State(backend): State<MockBackend>, Path(id): Path<String>) -> Response {
    match backend.data().products.iter().find(|p| p.id.as_str() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_product(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    if data.products.iter().any(|p| p.id == product.id) {
        return StatusCode::CONFLICT;
    }
    data.products.push(product);
    StatusCode::CREATED
}

async fn update_product(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(product): Json<Product>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    match data.products.iter_mut().find(|p| p.id.as_str() == id) {
        Some(existing) => {
            *existing = product;
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_product(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    let before = data.products.len();
    data.products.retain(|p| p.id.as_str() != id);
    if data.products.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn list_drops(State(backend): State<MockBackend>) -> Json<Vec<Drop>> {
    Json(backend.data().drops.clone())
}

async fn get_drop(State(backend): State<MockBackend>, Path(id): Path<String>) -> Response {
    match backend.data().drops.iter().find(|d| d.id.as_str() == id) {
        Some(drop) => Json(drop.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_drop(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(drop): Json<Drop>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    if data.drops.iter().any(|d| d.id == drop.id) {
        return StatusCode::CONFLICT;
    }
    data.drops.push(drop);
    StatusCode::CREATED
}

async fn update_drop(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<DropUpdate>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    match data.drops.iter_mut().find(|d| d.id.as_str() == id) {
        Some(drop) => {
            update.apply_to(drop);
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_drop(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut data = backend.data();
    let before = data.drops.len();
    data.drops.retain(|d| d.id.as_str() != id);
    if data.drops.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn create_checkout(State(backend): State<MockBackend>, Json(request): Json<Value>) -> Response {
    let mut data = backend.data();
    if data.fail_checkout {
        return (StatusCode::INTERNAL_SERVER_ERROR, "processor down").into_response();
    }
    data.checkouts.push(request);
    Json(serde_json::json!({
        "init_point": "https://pagos.test/checkout?pref=pref-1",
        "sandbox_init_point": SANDBOX_PAYMENT_URL,
        "preference_id": "pref-1",
    }))
    .into_response()
}

async fn upload(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };

        let mut data = backend.data();
        let n = data.uploads.len() + 1;
        data.uploads.push(ReceivedUpload {
            kind: kind.clone(),
            file_name,
            content_type,
            size: bytes.len(),
        });
        return Json(UploadedImage {
            url: format!("https://res.cloudinary.com/blessed/image/upload/v1/{kind}-{n}.jpg"),
            public_id: format!("blessed/{kind}-{n}"),
            width: 800,
            height: 1000,
        })
        .into_response();
    }
    StatusCode::BAD_REQUEST.into_response()
}

#[derive(Debug, Deserialize)]
struct DeleteUploadParams {
    public_id: String,
}

async fn delete_upload(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Query(params): Query<DeleteUploadParams>,
) -> StatusCode {
    if !authorized(&backend, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    backend.data().deleted_images.push(params.public_id);
    StatusCode::NO_CONTENT
}
