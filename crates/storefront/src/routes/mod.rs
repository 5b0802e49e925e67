//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Redirect to /{locale}
//! GET  /health                             - Health check
//! GET  /health/ready                       - Readiness check (database)
//!
//! # Pages (server-rendered, one set per locale)
//! GET  /{locale}                           - Home page
//! GET  /{locale}/products                  - Catalog (?category, ?q, ?sort, ?page, ...)
//! GET  /{locale}/products/{id}             - Product detail
//!
//! # SEO
//! GET  /robots.txt
//! GET  /sitemap.xml
//! GET  /api/seo/metadata                   - Head tags for client-rendered pages
//!
//! # Catalog API
//! GET  /api/products                       - Filtered, paginated product list
//! GET  /api/products/{id}                  - Product detail
//! GET  /api/categories                     - Categories with product counts
//!
//! # Cart API (guest or account)
//! GET    /api/cart                         - Current cart
//! DELETE /api/cart                         - Empty the cart
//! POST   /api/cart/items                   - Add product
//! PATCH  /api/cart/items/{product_id}      - Set quantity
//! DELETE /api/cart/items/{product_id}      - Remove line
//! POST   /api/cart/merge                   - Merge guest cart into account
//!
//! # Checkout and payments
//! POST /api/checkout/cash                  - Cash order (WhatsApp confirmation required)
//! POST /api/checkout/card                  - Start Stripe card payment
//! GET  /api/payments/{intent_id}           - Poll card payment state
//! POST /webhooks/stripe                    - Stripe webhook
//!
//! # Auth and account
//! POST  /api/auth/register
//! POST  /api/auth/login
//! POST  /api/auth/logout
//! GET   /api/account                       - Profile (requires auth)
//! PATCH /api/account                       - Update profile
//! POST  /api/account/avatar                - Upload avatar
//! GET   /api/account/orders                - Order history
//!
//! # Admin (requires is_admin)
//! /admin/api/...                           - See [`admin`]
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod pages;
pub mod payments;
pub mod products;
pub mod seo;

use axum::Router;

use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    // Cart and checkout writes hit the database on every call
    let shopping = Router::new()
        .merge(cart::router())
        .merge(checkout::router())
        .layer(api_rate_limiter());

    Router::new()
        .merge(pages::router())
        .merge(seo::router())
        .merge(products::router())
        .merge(shopping)
        .merge(payments::router())
        .merge(auth::router())
        .merge(account::router())
        .merge(admin::router())
}
