//! List cache for the admin panel.
//!
//! Lists are fetched once, then patched in place after every successful
//! mutation so the panel reflects the change without a refetch. A failed
//! mutation drops the list so the next read goes back to the backend.

use std::time::Duration;

use blessed_core::{Drop, DropId, DropUpdate, Product, ProductId};
use moka::future::Cache;

/// Cache key for the two admin lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ListKey {
    Products,
    Drops,
}

/// Cached list values.
#[derive(Debug, Clone)]
pub enum ListValue {
    Products(Vec<Product>),
    Drops(Vec<Drop>),
}

/// Cached product and drop lists.
#[derive(Clone)]
pub struct ListCache {
    cache: Cache<ListKey, ListValue>,
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ListCache {
    /// Create a cache whose lists expire after `ttl` (other writers, such as
    /// the CLI, become visible after that).
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(2).time_to_live(ttl).build(),
        }
    }

    pub async fn products(&self) -> Option<Vec<Product>> {
        match self.cache.get(&ListKey::Products).await {
            Some(ListValue::Products(products)) => Some(products),
            _ => None,
        }
    }

    pub async fn drops(&self) -> Option<Vec<Drop>> {
        match self.cache.get(&ListKey::Drops).await {
            Some(ListValue::Drops(drops)) => Some(drops),
            _ => None,
        }
    }

    pub async fn set_products(&self, products: Vec<Product>) {
        self.cache
            .insert(ListKey::Products, ListValue::Products(products))
            .await;
    }

    pub async fn set_drops(&self, drops: Vec<Drop>) {
        self.cache.insert(ListKey::Drops, ListValue::Drops(drops)).await;
    }

    /// Forget a list.
    pub async fn invalidate(&self, key: ListKey) {
        self.cache.invalidate(&key).await;
    }

    /// Insert or replace a product by id. Last write wins.
    pub async fn upsert_product(&self, product: Product) {
        if let Some(mut products) = self.products().await {
            match products.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => *existing = product,
                None => products.push(product),
            }
            self.set_products(products).await;
        }
    }

    pub async fn remove_product(&self, id: &ProductId) {
        if let Some(mut products) = self.products().await {
            products.retain(|p| &p.id != id);
            self.set_products(products).await;
        }
    }

    /// Insert or replace a drop by id. Last write wins.
    pub async fn upsert_drop(&self, drop: Drop) {
        if let Some(mut drops) = self.drops().await {
            match drops.iter_mut().find(|d| d.id == drop.id) {
                Some(existing) => *existing = drop,
                None => drops.push(drop),
            }
            self.set_drops(drops).await;
        }
    }

    /// Apply a partial update to a cached drop.
    pub async fn patch_drop(&self, id: &DropId, update: &DropUpdate) {
        if let Some(mut drops) = self.drops().await {
            if let Some(drop) = drops.iter_mut().find(|d| &d.id == id) {
                update.apply_to(drop);
            }
            self.set_drops(drops).await;
        }
    }

    pub async fn remove_drop(&self, id: &DropId) {
        if let Some(mut drops) = self.drops().await {
            drops.retain(|d| &d.id != id);
            self.set_drops(drops).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            cat: "tshirts".to_string(),
            drop: DropId::new("drop01"),
            name: name.to_string(),
            price: Decimal::from(30_000),
            original_price: Decimal::from(30_000),
            is_new: true,
            is_sale: false,
            images: vec!["https://cdn.test/a.jpg".to_string()],
            description: None,
            colors: Vec::new(),
            stock: Vec::new(),
        }
    }

    fn drop(id: &str, active: bool) -> Drop {
        Drop {
            id: DropId::new(id),
            number: "01".to_string(),
            label: "Origen".to_string(),
            tagline: "t".to_string(),
            description: "d".to_string(),
            hero_image: "https://cdn.test/h.jpg".to_string(),
            hero_image2: None,
            accent_color: "#e8e4dc".to_string(),
            release_date: "2026-03-05".to_string(),
            total_pieces: 50,
            active,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_mutations_ignore_missing_list() {
        let cache = ListCache::default();
        cache.upsert_product(product("a", "A")).await;
        assert!(cache.products().await.is_none());
    }

    #[tokio::test]
    async fn test_product_upsert_is_last_write_wins() {
        let cache = ListCache::default();
        cache.set_products(vec![product("a", "A")]).await;

        cache.upsert_product(product("b", "B")).await;
        cache.upsert_product(product("a", "A2")).await;
        let products = cache.products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products.first().unwrap().name, "A2");

        cache.remove_product(&ProductId::new("a")).await;
        let products = cache.products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products.first().unwrap().id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_drop_patch_and_invalidate() {
        let cache = ListCache::default();
        cache.set_drops(vec![drop("drop01", true), drop("drop02", true)]).await;

        cache
            .patch_drop(&DropId::new("drop02"), &DropUpdate::active(false))
            .await;
        let drops = cache.drops().await.unwrap();
        assert!(drops.first().unwrap().active);
        assert!(!drops.get(1).unwrap().active);

        cache.invalidate(ListKey::Drops).await;
        assert!(cache.drops().await.is_none());
    }
}
