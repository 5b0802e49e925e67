//! Ballonwerk Core - Shared types library.
//!
//! This crate provides common types used across all Ballonwerk components:
//! - `storefront` - Public shop, backend JSON API and admin dashboard
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, statuses and locales

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
