//! Integration tests for the catalog API and pages.
//!
//! These tests require:
//! - A running `PostgreSQL` database with seeded products
//! - The storefront running (cargo run -p ballonwerk-storefront)

use reqwest::StatusCode;
use serde_json::Value;

use ballonwerk_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_list_pagination() {
    let client = client();
    let body: Value = client
        .get(format!("{}/api/products?per_page=2&page=1", base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");

    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 2);
    assert!(body["items"].as_array().expect("items array").len() <= 2);

    // per_page is clamped
    let body: Value = client
        .get(format!("{}/api/products?per_page=1000", base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");
    assert_eq!(body["per_page"], 60);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_price_sort_is_ascending() {
    let body: Value = client()
        .get(format!("{}/api/products?sort=price_asc&per_page=60", base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");

    let prices: Vec<f64> = body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|p| p["price"].as_str()?.parse().ok())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_404() {
    let resp = client()
        .get(format!("{}/api/products/999999999", base_url()))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_categories_have_counts() {
    let body: Value = client()
        .get(format!("{}/api/categories", base_url()))
        .send()
        .await
        .expect("Failed to list categories")
        .json()
        .await
        .expect("Failed to parse categories");

    for category in body.as_array().expect("categories array") {
        assert!(category["count"].as_i64().expect("count") > 0);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_localized_catalog_page() {
    let client = client();
    for locale in ["de", "en", "ru", "uk"] {
        let resp = client
            .get(format!("{}/{locale}/products", base_url()))
            .send()
            .await
            .expect("Failed to get catalog page");
        assert_eq!(resp.status(), StatusCode::OK);

        let html = resp.text().await.expect("Failed to read page");
        assert!(html.contains(&format!("<html lang=\"{locale}\"")));
        assert!(html.contains("hreflang=\"x-default\""));
    }

    let resp = client
        .get(format!("{}/fr/products", base_url()))
        .send()
        .await
        .expect("Failed to get catalog page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
