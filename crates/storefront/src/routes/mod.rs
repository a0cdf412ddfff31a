//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero drop, featured products, open drops)
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Catalog
//! GET  /catalog                - Product grid (?filter=&sort=&view=)
//! GET  /drops/{id}             - Drop landing or coming-soon countdown (?sort=&view=)
//! GET  /product/{id}           - Product detail (?color=&image=)
//!
//! # Cart (fragments when sent with HX-Request)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit (product id, size, color)
//! POST /cart/update            - Set quantity (<= 0 removes)
//! POST /cart/remove            - Remove line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Current wizard step
//! POST /checkout/contact       - Step 1
//! POST /checkout/shipping-quote - Shipping options for a postal code (fragment)
//! POST /checkout/delivery      - Step 2
//! POST /checkout/back          - Previous step
//! POST /checkout/pay           - Create payment preference (rate limited)
//! GET  /checkout/{status}      - Payment result (success, failure, pending)
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod drops;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::payment_rate_limiter;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/contact", post(checkout::contact))
        .route("/shipping-quote", post(checkout::shipping_quote))
        .route("/delivery", post(checkout::delivery))
        .route("/back", post(checkout::back))
        .route("/pay", post(checkout::pay).layer(payment_rate_limiter()))
        .route("/{status}", get(checkout::result))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/catalog", get(catalog::index))
        .route("/drops/{id}", get(drops::show))
        .route("/product/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}
