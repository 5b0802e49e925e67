//! schema.org JSON-LD blocks.

use serde_json::{Value, json};

use ballonwerk_core::CurrencyCode;

use crate::models::product::Product;

use super::SITE_NAME;

/// The shop as a `Store`, for the home page.
#[must_use]
pub fn store(base_url: &str, description: &str, logo: &str) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Store",
        "name": SITE_NAME,
        "url": base_url,
        "logo": logo,
        "description": description,
    })
}

/// A product with its current offer.
#[must_use]
pub fn product(product: &Product, url: &str, image: Option<&str>, currency: CurrencyCode) -> Value {
    let availability = if product.is_available() {
        "https://schema.org/InStock"
    } else {
        "https://schema.org/OutOfStock"
    };

    let mut value = json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": product.name,
        "description": product.description,
        "sku": product.id.to_string(),
        "category": product.category,
        "brand": { "@type": "Brand", "name": SITE_NAME },
        "offers": {
            "@type": "Offer",
            "url": url,
            "price": format!("{:.2}", product.price.round_dp(2)),
            "priceCurrency": currency.code(),
            "availability": availability,
        },
    });
    if let (Some(image), Some(map)) = (image, value.as_object_mut()) {
        map.insert("image".to_string(), Value::String(image.to_string()));
    }
    value
}

/// A breadcrumb trail of `(name, url)` pairs.
#[must_use]
pub fn breadcrumbs(trail: &[(String, String)]) -> Value {
    let items: Vec<Value> = trail
        .iter()
        .enumerate()
        .map(|(i, (name, url))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": url,
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::tests::product as test_product;

    #[test]
    fn test_product_offer() {
        let p = test_product(7, "12.5", Some(0));
        let value = product(&p, "https://b.example/de/products/7", None, CurrencyCode::EUR);
        assert_eq!(value["@type"], "Product");
        assert_eq!(value["offers"]["price"], "12.50");
        assert_eq!(value["offers"]["priceCurrency"], "EUR");
        assert_eq!(value["offers"]["availability"], "https://schema.org/OutOfStock");
        assert!(value.get("image").is_none());
    }

    #[test]
    fn test_breadcrumb_positions_start_at_one() {
        let value = breadcrumbs(&[
            ("Home".to_string(), "https://b.example/en".to_string()),
            ("Catalog".to_string(), "https://b.example/en/products".to_string()),
        ]);
        assert_eq!(value["itemListElement"][0]["position"], 1);
        assert_eq!(value["itemListElement"][1]["name"], "Catalog");
    }
}
