//! Blessed Core - Shared domain library.
//!
//! This crate provides the domain types and arithmetic used across all Blessed
//! components:
//! - `storefront` - Public-facing shop (catalog, drops, cart, checkout)
//! - `admin` - Product and drop management console
//! - `cli` - Command-line tools for catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Persistence, payments and image storage live behind the backend
//! API, which the binaries talk to.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices and emails
//! - [`product`] - Products, colors and per-size stock
//! - [`drop`] - Limited-release drops
//! - [`cart`] - Session cart with merge-by-variant lines
//! - [`catalog`] - Filters, sort orders and grid views
//! - [`shipping`] - Postal-code zone shipping quotes
//! - [`checkout`] - Checkout forms, payment request and result pages
//! - [`countdown`] - Drop release countdown and date display
//! - [`wizard`] - Linear multi-step form flows
//! - [`media`] - Image upload slots and CDN transformations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod countdown;
pub mod drop;
pub mod media;
pub mod product;
pub mod shipping;
pub mod types;
pub mod wizard;

pub use cart::{Cart, CartError, CartLine, NewCartItem};
pub use drop::{Drop, DropInput, DropUpdate};
pub use product::{Category, Product, ProductColor, ProductStock};
pub use types::*;
