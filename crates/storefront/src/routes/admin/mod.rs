//! Admin dashboard API.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin),
//! which re-reads the user's admin flag from the database.
//!
//! ```text
//! GET    /admin/api/dashboard                   - Order counts, revenue, low stock
//! POST   /admin/api/products                    - Create product
//! PUT    /admin/api/products/{id}               - Replace product
//! DELETE /admin/api/products/{id}               - Delete product
//! POST   /admin/api/products/{id}/images        - Upload product image
//! GET    /admin/api/orders                      - List orders (?status, ?page)
//! GET    /admin/api/orders/{id}                 - Order detail
//! PATCH  /admin/api/orders/{id}/status          - Move order forward
//! GET    /admin/api/payments                    - List Stripe payments (?status, ?page)
//! POST   /admin/api/payments/{intent_id}/sync   - Re-read intent from Stripe
//! GET    /admin/api/users                       - List users (?page)
//! PUT    /admin/api/users/{id}/admin            - Grant or revoke admin
//! ```

pub mod dashboard;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(users::router())
}
