//! Integration tests for guest and account carts.
//!
//! These tests require:
//! - A running `PostgreSQL` database with at least one in-stock product
//! - The storefront running (cargo run -p ballonwerk-storefront)

use reqwest::StatusCode;
use serde_json::{Value, json};

use ballonwerk_integration_tests::{
    add_to_cart, base_url, client, in_stock_product_id, register,
};

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_guest_cart_add_update_remove() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;

    let cart = add_to_cart(&client, product_id, 1).await;
    assert_eq!(cart["item_count"], 1);

    // Adding the same product again increases the quantity
    let cart = add_to_cart(&client, product_id, 1).await;
    assert_eq!(cart["lines"].as_array().expect("lines").len(), 1);
    assert_eq!(cart["lines"][0]["quantity"], 2);

    let cart: Value = client
        .patch(format!("{}/api/cart/items/{product_id}", base_url()))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to update quantity")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["lines"][0]["quantity"], 1);

    let cart: Value = client
        .delete(format!("{}/api/cart/items/{product_id}", base_url()))
        .send()
        .await
        .expect("Failed to remove line")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_invalid_quantity_rejected() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;

    let resp = client
        .post(format!("{}/api/cart/items", base_url()))
        .json(&json!({ "product_id": product_id, "quantity": 0 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "invalid_quantity");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_rejected() {
    let resp = client()
        .post(format!("{}/api/cart/items", base_url()))
        .header("accept-language", "en")
        .json(&json!({ "product_id": 999_999_999, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "product_not_found");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_guest_cart_merged_on_register() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    add_to_cart(&client, product_id, 1).await;

    register(&client).await;

    let cart: Value = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 1);
    assert_eq!(cart["lines"][0]["product_id"], product_id);

    // Second merge finds no guest cart and changes nothing
    let merge: Value = client
        .post(format!("{}/api/cart/merge", base_url()))
        .send()
        .await
        .expect("Failed to merge")
        .json()
        .await
        .expect("Failed to parse merge");
    assert_eq!(merge["merged"], 0);
    assert_eq!(merge["cart"]["item_count"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_merge_requires_sign_in() {
    let resp = client()
        .post(format!("{}/api/cart/merge", base_url()))
        .send()
        .await
        .expect("Failed to merge");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_account_update_does_not_add_absent_line() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    register(&client).await;

    let cart: Value = client
        .patch(format!("{}/api/cart/items/{product_id}", base_url()))
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .expect("Failed to update quantity")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 0);
    assert!(cart["lines"].as_array().expect("lines").is_empty());
}
