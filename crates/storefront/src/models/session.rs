//! Session-related types.
//!
//! Types stored in the session for authentication state and the guest cart.

use serde::{Deserialize, Serialize};

use ballonwerk_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// Admin rights are not cached here; they are re-read from the database on
/// every admin request so a revoked flag takes effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart of a visitor who is not signed in.
    pub const GUEST_CART: &str = "guest_cart";

    /// Key for the payment intent started by this session's card checkout.
    pub const PENDING_PAYMENT: &str = "pending_payment";
}
