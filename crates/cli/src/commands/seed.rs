//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Gold number balloon "1"
//!     description: 100 cm foil number, filled with helium
//!     price: "12.50"
//!     category: Numbers
//!     category_group: Foil
//!     stock_quantity: 20
//!     colors: [gold, silver]
//! ```
//!
//! Products go through the same validation as the admin API. Invalid
//! entries are reported and skipped.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use ballonwerk_storefront::models::product::ProductInput;
use ballonwerk_storefront::services::catalog::CatalogService;

use super::connect;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<ProductInput>,
}

/// Parse a seed file.
///
/// # Errors
///
/// Returns an error if the YAML does not match [`SeedFile`].
pub fn parse(content: &str) -> Result<SeedFile, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Insert every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the database
/// is unreachable.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Parse before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed = parse(&content)?;
    info!(products = seed.products.len(), "Parsed seed file");

    let pool = connect().await?;
    let catalog = CatalogService::new(pool);

    let mut inserted = 0usize;
    let mut failed = Vec::new();
    for input in &seed.products {
        match catalog.create(input).await {
            Ok(product) => {
                info!(id = %product.id, name = %product.name, "Inserted product");
                inserted += 1;
            }
            Err(e) => failed.push((input.name.clone(), e)),
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    if !failed.is_empty() {
        error!("  Errors: {}", failed.len());
        for (name, err) in &failed {
            error!("    - {name}: {err}");
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(
            r#"
products:
  - name: Heart foil balloon
    price: "4.90"
    category: Hearts
    category_group: Foil
    colors: [red]
  - name: Latex set
    description: Ten pastel balloons
    price: "7.00"
    category: Sets
    category_group: Latex
    in_stock: false
"#,
        )
        .unwrap();

        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].price.to_string(), "4.90");
        assert!(seed.products[0].in_stock);
        assert_eq!(seed.products[0].colors, vec!["red".to_string()]);
        assert!(!seed.products[1].in_stock);
        assert_eq!(seed.products[1].description, "Ten pastel balloons");
    }

    #[test]
    fn test_parse_rejects_missing_price() {
        let result = parse(
            r"
products:
  - name: No price
    category: Hearts
    category_group: Foil
",
        );
        assert!(result.is_err());
    }
}
