//! Integration tests for checkout.
//!
//! These tests require:
//! - A running `PostgreSQL` database with at least one in-stock product
//! - The storefront running (cargo run -p ballonwerk-storefront)
//! - Stripe test keys for the card test

use reqwest::StatusCode;
use serde_json::Value;

use ballonwerk_integration_tests::{
    add_to_cart, base_url, checkout_form, client, in_stock_product_id,
};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_with_empty_cart_rejected() {
    let resp = client()
        .post(format!("{}/api/checkout/cash", base_url()))
        .json(&checkout_form(true))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "cart_empty");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_cash_checkout_requires_whatsapp_confirmation() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    add_to_cart(&client, product_id, 1).await;

    let resp = client
        .post(format!("{}/api/checkout/cash", base_url()))
        .json(&checkout_form(false))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "whatsapp_confirmation_required");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_cash_checkout_places_order_and_empties_cart() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    add_to_cart(&client, product_id, 1).await;

    let resp = client
        .post(format!("{}/api/checkout/cash", base_url()))
        .json(&checkout_form(true))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["payment_method"], "cash");
    assert_eq!(order["whatsapp_confirmed"], true);
    assert_eq!(order["items"][0]["product_id"], product_id);

    let cart: Value = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_invalid_form_lists_fields() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    add_to_cart(&client, product_id, 1).await;

    let mut form = checkout_form(true);
    form["phone"] = Value::String("call me".to_string());
    form["delivery_type"] = Value::String("delivery".to_string());

    let resp = client
        .post(format!("{}/api/checkout/cash", base_url()))
        .json(&form)
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "validation");
    assert!(body["fields"]["phone"].is_string());
    assert!(body["fields"]["street"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server, seeded products and Stripe test keys"]
async fn test_card_checkout_returns_client_secret() {
    let client = client();
    let product_id = in_stock_product_id(&client).await;
    add_to_cart(&client, product_id, 1).await;

    let checkout: Value = client
        .post(format!("{}/api/checkout/card", base_url()))
        .json(&checkout_form(false))
        .send()
        .await
        .expect("Failed to start card payment")
        .json()
        .await
        .expect("Failed to parse card checkout");

    let intent_id = checkout["intent_id"].as_str().expect("intent_id");
    assert!(intent_id.starts_with("pi_"));
    assert!(checkout["client_secret"].is_string());

    // Not paid yet, so no order exists
    let lookup: Value = client
        .get(format!("{}/api/payments/{intent_id}", base_url()))
        .send()
        .await
        .expect("Failed to look up payment")
        .json()
        .await
        .expect("Failed to parse lookup");
    assert!(lookup["order_id"].is_null());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_webhook_without_signature_rejected() {
    let resp = client()
        .post(format!("{}/webhooks/stripe", base_url()))
        .body("{}")
        .send()
        .await
        .expect("Failed to post webhook");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
