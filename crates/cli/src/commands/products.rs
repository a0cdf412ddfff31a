//! Product catalog commands.
//!
//! # Usage
//!
//! ```bash
//! # List every product, or filter like the storefront does
//! blessed products list
//! blessed products list --drop drop02 --cat hoodies
//!
//! # Create products from a YAML file (validate only with --dry-run)
//! blessed products import catalog.yaml
//! ```
//!
//! # Import Format
//!
//! A YAML list using the backend's field names:
//!
//! ```yaml
//! - id: tee-boxy-negra
//!   cat: tshirts
//!   drop: drop02
//!   name: Boxy Tee Negra
//!   price: 51000
//!   originalPrice: 60000
//!   isNew: true
//!   images:
//!     - https://res.cloudinary.com/blessed/image/upload/v1/tee.jpg
//!   stock:
//!     - { size: M, stock: 4 }
//! ```

use std::path::Path;

use blessed_core::catalog::ProductQuery;
use blessed_core::{DropId, Product, format_price};

use super::{CliError, backend_from_env};

/// Parse an import file's contents.
///
/// # Errors
///
/// Returns `CliError::Yaml` if the document is not a list of products.
pub fn parse_import(content: &str) -> Result<Vec<Product>, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Validation failures, as `(product id, message)`.
#[must_use]
pub fn invalid_products(products: &[Product]) -> Vec<(String, String)> {
    products
        .iter()
        .filter_map(|p| {
            p.validate()
                .err()
                .map(|e| (p.id.to_string(), e.to_string()))
        })
        .collect()
}

/// One line of `products list` output.
#[must_use]
pub fn list_line(product: &Product) -> String {
    let mut flags = Vec::new();
    if product.is_new {
        flags.push("nuevo".to_owned());
    }
    if product.is_sale {
        flags.push(format!("-{}%", product.discount_percent()));
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:<24} {:<10} {:<8} {:>10}  {}{flags}",
        product.id.as_str(),
        product.cat,
        product.drop.as_str(),
        format_price(product.price),
        product.name,
    )
}

/// List products, optionally filtered by drop and category.
///
/// # Errors
///
/// Returns an error if the backend request fails.
#[allow(clippy::print_stdout)]
pub async fn list(drop: Option<String>, cat: Option<String>) -> Result<(), CliError> {
    let backend = backend_from_env()?;
    let query = ProductQuery {
        drop: drop.map(DropId::new),
        cat,
    };
    let products = backend.query_products(&query).await?;

    for product in &products {
        println!("{}", list_line(product));
    }
    tracing::info!(count = products.len(), "Listed products");
    Ok(())
}

/// Create every product in a YAML file.
///
/// All products are validated before anything is sent; a failed create is
/// logged and the rest are still attempted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if any product is
/// invalid, or if any create fails.
pub async fn import(file_path: &str, dry_run: bool) -> Result<(), CliError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CliError::Invalid(format!("File not found: {file_path}")));
    }

    tracing::info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_import(&content)?;
    tracing::info!(count = products.len(), "Parsed products");

    let invalid = invalid_products(&products);
    if !invalid.is_empty() {
        for (id, message) in &invalid {
            tracing::error!(product_id = %id, "{message}");
        }
        return Err(CliError::Invalid(format!(
            "{} invalid product(s), nothing imported",
            invalid.len()
        )));
    }

    if dry_run {
        tracing::info!("Dry run: all products valid, nothing sent");
        return Ok(());
    }

    let backend = backend_from_env()?;
    let mut failed = 0usize;
    for product in &products {
        match backend.create_product(product).await {
            Ok(()) => tracing::info!(product_id = %product.id, "Created"),
            Err(e) => {
                failed += 1;
                tracing::error!(product_id = %product.id, "Create failed: {e}");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Invalid(format!(
            "{failed} of {} product(s) failed to import",
            products.len()
        )));
    }
    tracing::info!(count = products.len(), "Import complete");
    Ok(())
}
