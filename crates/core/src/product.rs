//! Catalog products, their color variants and per-size stock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DropId, ProductId, discount_percent};

/// Standard size ladder, smallest first.
pub const SIZES: [&str; 5] = ["XS", "S", "M", "L", "XL"];

/// Product categories the admin can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tshirts,
    Hoodies,
    Crewnecks,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 3] = [Self::Tshirts, Self::Hoodies, Self::Crewnecks];

    /// Slug used by the backend and in query strings.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Tshirts => "tshirts",
            Self::Hoodies => "hoodies",
            Self::Crewnecks => "crewnecks",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tshirts => "T-Shirts",
            Self::Hoodies => "Hoodies",
            Self::Crewnecks => "Crewnecks",
        }
    }

    /// Look up a category by slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

/// A named color swatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    pub name: String,
    pub hex: String,
}

/// Units on hand for one size, optionally scoped to one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    pub size: String,
    #[serde(default)]
    pub color: Option<String>,
    pub stock: u32,
}

/// A product as served by the backend API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Category slug (see [`Category`]).
    pub cat: String,
    pub drop: DropId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub colors: Vec<ProductColor>,
    #[serde(default)]
    pub stock: Vec<ProductStock>,
}

/// Reasons a product fails admin form validation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    #[error("El ID es obligatorio.")]
    MissingId,
    #[error("El nombre es obligatorio.")]
    MissingName,
    #[error("Categoría inválida.")]
    InvalidCategory,
    #[error("Seleccioná un drop.")]
    MissingDrop,
    #[error("El precio debe ser mayor a 0.")]
    InvalidPrice,
    #[error("El precio original debe ser mayor a 0.")]
    InvalidOriginalPrice,
    #[error("La foto principal es obligatoria.")]
    MissingMainImage,
}

impl Product {
    /// Whole-number discount off the original price (0 when not marked down).
    #[must_use]
    pub fn discount_percent(&self) -> u32 {
        discount_percent(self.price, self.original_price)
    }

    /// Discount shown to shoppers: only products marked as on sale have one.
    #[must_use]
    pub fn sale_discount(&self) -> u32 {
        if self.is_sale {
            self.discount_percent()
        } else {
            0
        }
    }

    /// Units available for a size, optionally restricted to a color.
    ///
    /// The first stock entry whose size matches (and whose color matches, when
    /// one is given) wins. Unknown combinations have no stock.
    #[must_use]
    pub fn stock_for(&self, size: &str, color: Option<&str>) -> u32 {
        self.stock
            .iter()
            .find(|s| s.size == size && color.is_none_or(|c| s.color.as_deref() == Some(c)))
            .map_or(0, |s| s.stock)
    }

    /// Whether a size can be added to the cart.
    #[must_use]
    pub fn is_size_available(&self, size: &str, color: Option<&str>) -> bool {
        self.stock_for(size, color) > 0
    }

    /// The image shown in grids and the cart.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// The color preselected on the detail page.
    #[must_use]
    pub fn default_color(&self) -> Option<&str> {
        self.colors.first().map(|c| c.name.as_str())
    }

    /// Whether `name` is one of this product's colors.
    #[must_use]
    pub fn has_color(&self, name: &str) -> bool {
        self.colors.iter().any(|c| c.name == name)
    }

    /// Case-insensitive substring match on name or category.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.cat.to_lowercase().contains(&query)
    }

    /// Check the fields the admin form requires.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductValidationError`] found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ProductValidationError::MissingId);
        }
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::MissingName);
        }
        if Category::from_slug(&self.cat).is_none() {
            return Err(ProductValidationError::InvalidCategory);
        }
        if self.drop.as_str().trim().is_empty() {
            return Err(ProductValidationError::MissingDrop);
        }
        if self.price < Decimal::ONE {
            return Err(ProductValidationError::InvalidPrice);
        }
        if self.original_price < Decimal::ONE {
            return Err(ProductValidationError::InvalidOriginalPrice);
        }
        if self.images.first().is_none_or(|url| url.is_empty()) {
            return Err(ProductValidationError::MissingMainImage);
        }
        Ok(())
    }
}
