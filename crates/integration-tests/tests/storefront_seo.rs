//! Integration tests for `robots.txt`, the sitemap and page metadata.
//!
//! These tests require the storefront running (cargo run -p ballonwerk-storefront).

use reqwest::StatusCode;
use serde_json::Value;

use ballonwerk_integration_tests::{base_url, client, in_stock_product_id};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_robots_txt() {
    let resp = client()
        .get(format!("{}/robots.txt", base_url()))
        .send()
        .await
        .expect("Failed to get robots.txt");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Disallow: /admin"));
    assert!(body.contains("Sitemap: "));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_sitemap_lists_every_locale() {
    let resp = client()
        .get(format!("{}/sitemap.xml", base_url()))
        .send()
        .await
        .expect("Failed to get sitemap");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .expect("content type")
            .starts_with("application/xml")
    );

    let body = resp.text().await.expect("Failed to read body");
    assert!(body.starts_with("<?xml"));
    for locale in ["de", "en", "ru", "uk"] {
        assert!(body.contains(&format!("/{locale}/products</loc>")));
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_product_metadata() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;

    let meta: Value = client
        .get(format!(
            "{}/api/seo/metadata?locale=en&page=product&product_id={product_id}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to get metadata")
        .json()
        .await
        .expect("Failed to parse metadata");

    assert!(
        meta["canonical"]
            .as_str()
            .expect("canonical")
            .ends_with(&format!("/en/products/{product_id}"))
    );
    assert_eq!(meta["alternates"].as_array().expect("alternates").len(), 5);
    assert_eq!(meta["robots"], "index, follow");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_private_pages_are_noindex() {
    let meta: Value = client()
        .get(format!("{}/api/seo/metadata?locale=de&page=cart", base_url()))
        .send()
        .await
        .expect("Failed to get metadata")
        .json()
        .await
        .expect("Failed to parse metadata");
    assert_eq!(meta["robots"], "noindex, nofollow");
}
