//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password accounts, profiles and admin flags
//! - `catalog` - Cached product reads and admin product management
//! - `cart` - Account and guest carts, guest cart merge on sign-in
//! - `checkout` - Cash orders and card payment intents
//! - `payments` - Stripe client, webhooks and payment reconciliation
//! - `storage` - Uploaded media and CDN image URLs
//!
//! Services borrow what they need from [`crate::state::AppState`] and are
//! created per request.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payments;
pub mod storage;
