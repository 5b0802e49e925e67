//! Integration tests for the Ballonwerk storefront.
//!
//! The tests talk to a running storefront over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare a database with at least one in-stock product
//! bw-cli migrate
//! bw-cli seed products catalog.yaml
//!
//! # Start the storefront, then run the ignored tests
//! cargo run -p ballonwerk-storefront &
//! cargo test -p ballonwerk-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` overrides the default `http://localhost:3000`.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique address for a throwaway account.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Register a fresh account on `client`, leaving it signed in.
///
/// Returns the account email.
///
/// # Panics
///
/// Panics if registration does not succeed.
pub async fn register(client: &Client) -> String {
    let email = unique_email();
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "password": "correct-horse-battery-staple",
            "name": "Test Shopper",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    email
}

/// ID of some product that can be added to a cart.
///
/// # Panics
///
/// Panics if the catalog has no in-stock products.
pub async fn in_stock_product_id(client: &Client) -> i64 {
    let body: Value = client
        .get(format!("{}/api/products?in_stock_only=true&per_page=1", base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse product list");

    body["items"][0]["id"]
        .as_i64()
        .expect("Catalog has no in-stock products; seed it first")
}

/// Add `quantity` of `product_id` to the cart and return the cart body.
///
/// # Panics
///
/// Panics if the request fails or the body is not JSON.
pub async fn add_to_cart(client: &Client, product_id: i64, quantity: i64) -> Value {
    client
        .post(format!("{}/api/cart/items", base_url()))
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart")
        .json()
        .await
        .expect("Failed to parse cart")
}

/// A valid pickup checkout form.
#[must_use]
pub fn checkout_form(whatsapp_confirmed: bool) -> Value {
    json!({
        "name": "Test Shopper",
        "email": unique_email(),
        "phone": "+49 170 1234567",
        "delivery_type": "pickup",
        "whatsapp_confirmed": whatsapp_confirmed,
    })
}
