//! Integration tests for admin access control.
//!
//! These tests require the storefront running (cargo run -p ballonwerk-storefront).

use reqwest::StatusCode;

use ballonwerk_integration_tests::{base_url, client, register};

const ADMIN_ENDPOINTS: &[&str] = &[
    "/admin/api/dashboard",
    "/admin/api/orders",
    "/admin/api/payments",
    "/admin/api/users",
];

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_admin_requires_sign_in() {
    let client = client();
    for path in ADMIN_ENDPOINTS {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to call admin endpoint");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_admin_forbidden_for_shoppers() {
    let client = client();
    register(&client).await;

    for path in ADMIN_ENDPOINTS {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to call admin endpoint");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_logout_ends_session() {
    let client = client();
    register(&client).await;

    let resp = client
        .post(format!("{}/api/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{}/api/account", base_url()))
        .send()
        .await
        .expect("Failed to get account");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
