//! Domain models for the storefront.
//!
//! Domain types are separate from database row types; repositories in
//! [`crate::db`] convert between the two.

pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod session;
pub mod user;
pub mod validation;

pub use session::{CurrentUser, keys as session_keys};
pub use validation::ValidationErrors;
