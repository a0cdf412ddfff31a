//! Session-held shopping cart.
//!
//! A cart is a list of lines, one per distinct (product, size, color)
//! combination. Adding an item that is already in the cart bumps that line's
//! quantity instead of creating a duplicate, so every stored line has a
//! unique [`VariantKey`] and a quantity of at least 1.
//!
//! The cart never talks to the backend; the storefront keeps it in the
//! visitor's session and sends the lines along with the checkout request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, installment_hint};

/// Most units a single line can hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart mutations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line can only be added once a size is chosen.
    #[error("Seleccioná un talle.")]
    MissingSize,
    /// No line with this id.
    #[error("cart line not found: {0}")]
    LineNotFound(CartLineId),
}

/// One line in the cart.
///
/// Field names match the item shape the backend expects in a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    /// Product display name.
    pub product: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// The key that identifies this line's variant.
    #[must_use]
    pub fn key(&self) -> VariantKey<'_> {
        VariantKey::new(&self.product, &self.size, self.color.as_deref())
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Something to put in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product: String,
    pub price: Decimal,
    pub size: String,
    pub color: Option<String>,
    pub image: Option<String>,
}

/// Identity of a cart line. A missing color and an empty color are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey<'a> {
    product: &'a str,
    size: &'a str,
    color: &'a str,
}

impl<'a> VariantKey<'a> {
    #[must_use]
    pub fn new(product: &'a str, size: &'a str, color: Option<&'a str>) -> Self {
        Self {
            product,
            size,
            color: color.unwrap_or_default(),
        }
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of an item.
    ///
    /// Merges into the existing line for the same variant, otherwise appends a
    /// new line with quantity 1. Returns the affected line's id.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSize`] when no size was chosen.
    pub fn add(&mut self, item: NewCartItem) -> Result<CartLineId, CartError> {
        if item.size.trim().is_empty() {
            return Err(CartError::MissingSize);
        }
        let color = item.color.filter(|c| !c.is_empty());
        let key = VariantKey::new(&item.product, &item.size, color.as_deref());

        if let Some(line) = self.lines.iter_mut().find(|l| l.key() == key) {
            line.quantity = line.quantity.saturating_add(1).min(MAX_LINE_QUANTITY);
            return Ok(line.id.clone());
        }

        let id = CartLineId::generate();
        self.lines.push(CartLine {
            id: id.clone(),
            product: item.product,
            price: item.price,
            size: item.size,
            color,
            quantity: 1,
            image: item.image,
        });
        Ok(id)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when no line has this id.
    pub fn remove(&mut self, id: &CartLineId) -> Result<CartLine, CartError> {
        let pos = self
            .lines
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;
        Ok(self.lines.remove(pos))
    }

    /// Set a line's quantity. Zero or less removes the line; anything above
    /// [`MAX_LINE_QUANTITY`] is capped.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when no line has this id.
    pub fn update_quantity(&mut self, id: &CartLineId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove(id).map(|_| ());
        }
        let quantity = u32::try_from(quantity)
            .map_or(MAX_LINE_QUANTITY, |q| q.min(MAX_LINE_QUANTITY));
        self.set_quantity(id, quantity)
    }

    fn set_quantity(&mut self, id: &CartLineId, quantity: u32) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Sum of `price * quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Installment hint for the cart total, `None` when the cart is empty.
    #[must_use]
    pub fn installments(&self) -> Option<String> {
        (!self.is_empty()).then(|| installment_hint(self.total()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(product: &str, price: i64, size: &str, color: Option<&str>) -> NewCartItem {
        NewCartItem {
            product: product.to_owned(),
            price: Decimal::from(price),
            size: size.to_owned(),
            color: color.map(str::to_owned),
            image: None,
        }
    }

    #[test]
    fn test_add_merges_same_variant() {
        let mut cart = Cart::new();
        let a = cart.add(item("Boxy Tee", 30_000, "M", Some("Negro"))).unwrap();
        let b = cart.add(item("Boxy Tee", 30_000, "M", Some("Negro"))).unwrap();
        assert_eq!(a, b);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_distinguishes_size_and_color() {
        let mut cart = Cart::new();
        cart.add(item("Boxy Tee", 30_000, "M", Some("Negro"))).unwrap();
        cart.add(item("Boxy Tee", 30_000, "L", Some("Negro"))).unwrap();
        cart.add(item("Boxy Tee", 30_000, "M", Some("Blanco"))).unwrap();
        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_missing_and_empty_color_share_a_line() {
        let mut cart = Cart::new();
        cart.add(item("Hoodie", 50_000, "S", None)).unwrap();
        cart.add(item("Hoodie", 50_000, "S", Some(""))).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].color, None);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_add_requires_size() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(item("Hoodie", 1, " ", None)).unwrap_err(),
            CartError::MissingSize
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_and_count() {
        let mut cart = Cart::new();
        let tee = cart.add(item("Tee", 25_000, "M", None)).unwrap();
        cart.add(item("Hoodie", 60_000, "L", None)).unwrap();
        cart.update_quantity(&tee, 3).unwrap();
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.total(), Decimal::from(135_000));
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let id = cart.add(item("Tee", 1, "M", None)).unwrap();
        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());

        let id = cart.add(item("Tee", 1, "M", None)).unwrap();
        cart.update_quantity(&id, -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::new();
        let id = cart.add(item("Tee", 1, "M", None)).unwrap();
        cart.update_quantity(&id, 99_999_999_999).unwrap();
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);

        // Adding the same variant again stays at the cap
        cart.add(item("Tee", 1, "M", None)).unwrap();
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);

        cart.add(item("Tee", 1, "L", None)).unwrap();
        assert_eq!(cart.count(), MAX_LINE_QUANTITY + 1);
    }

    #[test]
    fn test_count_saturates() {
        let line = |quantity| CartLine {
            id: CartLineId::generate(),
            product: "Tee".to_owned(),
            price: Decimal::ONE,
            size: "M".to_owned(),
            color: None,
            quantity,
            image: None,
        };
        let cart = Cart {
            lines: vec![line(u32::MAX), line(5)],
        };
        assert_eq!(cart.count(), u32::MAX);
    }

    #[test]
    fn test_unknown_line_is_reported() {
        let mut cart = Cart::new();
        let ghost = CartLineId::new("nope");
        assert_eq!(
            cart.update_quantity(&ghost, 2).unwrap_err(),
            CartError::LineNotFound(ghost.clone())
        );
        assert!(cart.remove(&ghost).is_err());
    }

    #[test]
    fn test_installments() {
        let mut cart = Cart::new();
        assert_eq!(cart.installments(), None);
        cart.add(item("Tee", 51_000, "M", None)).unwrap();
        assert_eq!(
            cart.installments().as_deref(),
            Some("3 cuotas sin interés de $17.000")
        );
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item("Tee", 1, "M", None)).unwrap();
        cart.clear();
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_line_serializes_backend_item_shape() {
        let mut cart = Cart::new();
        cart.add(item("Tee", 1_500, "M", Some("Negro"))).unwrap();
        let value = serde_json::to_value(&cart.lines()[0]).unwrap();
        assert_eq!(value["product"], "Tee");
        assert_eq!(value["price"], serde_json::json!(1500.0));
        assert_eq!(value["quantity"], 1);
        assert_eq!(value["color"], "Negro");
        assert!(value.get("image").is_none());
    }
}
