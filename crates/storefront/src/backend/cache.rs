//! Cache types for backend API responses.

use blessed_core::catalog::ProductQuery;
use blessed_core::{Drop, DropId, Product, ProductId};

/// Cache key for products and drops.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        drop: Option<DropId>,
        cat: Option<String>,
    },
    Drop(DropId),
    Drops,
}

impl CacheKey {
    /// Key for a product listing.
    #[must_use]
    pub fn products(query: &ProductQuery) -> Self {
        Self::Products {
            drop: query.drop.clone(),
            cat: query.cat.clone(),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Drop(Box<Drop>),
    Drops(Vec<Drop>),
}
