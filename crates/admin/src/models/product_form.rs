//! Product form values as entered in the admin.

use std::str::FromStr;

use blessed_core::product::ProductValidationError;
use blessed_core::{Category, DropId, Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw product form fields.
///
/// Kept as strings so a rejected submit can be re-rendered exactly as typed.
/// Checkboxes are present (`Some`) when ticked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cat: String,
    #[serde(default)]
    pub drop: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub is_new: Option<String>,
    #[serde(default)]
    pub is_sale: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            cat: Category::Tshirts.slug().to_string(),
            drop: String::new(),
            price: String::new(),
            original_price: String::new(),
            is_new: Some("on".to_string()),
            is_sale: None,
            description: String::new(),
        }
    }
}

/// Parse a price field; anything unparseable reads as zero and fails validation.
fn parse_amount(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim().replace(',', ".").as_str()).unwrap_or(Decimal::ZERO)
}

impl ProductForm {
    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            cat: product.cat.clone(),
            drop: product.drop.to_string(),
            price: product.price.normalize().to_string(),
            original_price: product.original_price.normalize().to_string(),
            is_new: product.is_new.then(|| "on".to_string()),
            is_sale: product.is_sale.then(|| "on".to_string()),
            description: product.description.clone().unwrap_or_default(),
        }
    }

    /// Preselect a drop when none is chosen yet.
    pub fn default_drop(&mut self, drop: Option<&DropId>) {
        if self.drop.is_empty() {
            if let Some(drop) = drop {
                self.drop = drop.to_string();
            }
        }
    }

    /// Build the product payload.
    ///
    /// Colors and stock are not edited here; they are carried over from
    /// `existing` when updating.
    #[must_use]
    pub fn to_product(&self, images: Vec<String>, existing: Option<&Product>) -> Product {
        let description = self.description.trim();
        Product {
            id: ProductId::new(self.id.trim()),
            cat: self.cat.trim().to_string(),
            drop: DropId::new(self.drop.trim()),
            name: self.name.trim().to_string(),
            price: parse_amount(&self.price),
            original_price: parse_amount(&self.original_price),
            is_new: self.is_new.is_some(),
            is_sale: self.is_sale.is_some(),
            images,
            description: (!description.is_empty()).then(|| description.to_string()),
            colors: existing.map(|p| p.colors.clone()).unwrap_or_default(),
            stock: existing.map(|p| p.stock.clone()).unwrap_or_default(),
        }
    }

    /// Validate everything except the images (the details step).
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate_details(&self) -> Result<(), ProductValidationError> {
        match self.to_product(Vec::new(), None).validate() {
            Ok(()) | Err(ProductValidationError::MissingMainImage) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::{ProductColor, ProductStock};

    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            id: " tee-03 ".to_string(),
            name: "Boxy Tee".to_string(),
            cat: "tshirts".to_string(),
            drop: "drop02".to_string(),
            price: "35000".to_string(),
            original_price: "42000,50".to_string(),
            is_new: None,
            is_sale: Some("on".to_string()),
            description: "  ".to_string(),
        }
    }

    #[test]
    fn test_to_product_parses_fields() {
        let product = form().to_product(vec!["a.jpg".to_string()], None);
        assert_eq!(product.id.as_str(), "tee-03");
        assert_eq!(product.price, Decimal::from(35_000));
        assert_eq!(product.original_price, Decimal::new(4_200_050, 2));
        assert!(!product.is_new);
        assert!(product.is_sale);
        assert_eq!(product.description, None);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_details_validation_ignores_images() {
        assert!(form().validate_details().is_ok());

        let mut bad = form();
        bad.price = "gratis".to_string();
        assert_eq!(
            bad.validate_details(),
            Err(ProductValidationError::InvalidPrice)
        );

        let mut bad = form();
        bad.cat = "socks".to_string();
        assert_eq!(
            bad.validate_details(),
            Err(ProductValidationError::InvalidCategory)
        );
    }

    #[test]
    fn test_update_keeps_colors_and_stock() {
        let mut existing = form().to_product(vec!["a.jpg".to_string()], None);
        existing.colors = vec![ProductColor {
            name: "Negro".to_string(),
            hex: "#000".to_string(),
        }];
        existing.stock = vec![ProductStock {
            size: "M".to_string(),
            color: None,
            stock: 4,
        }];

        let round = ProductForm::from_product(&existing);
        assert_eq!(round.original_price, "42000.5");
        let updated = round.to_product(existing.images.clone(), Some(&existing));
        assert_eq!(updated, existing);
    }

    #[test]
    fn test_default_drop_only_fills_blank() {
        let mut form = ProductForm::default();
        form.default_drop(Some(&DropId::new("drop01")));
        assert_eq!(form.drop, "drop01");
        form.default_drop(Some(&DropId::new("drop02")));
        assert_eq!(form.drop, "drop01");
    }
}
