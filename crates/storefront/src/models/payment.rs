//! Card payments tracked alongside the provider's payment intents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ballonwerk_core::{CurrencyCode, Locale, OrderId, PaymentId, PaymentStatus, UserId};

use super::order::{CheckoutDetails, OrderItem};

/// Everything needed to create the order once the payment succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub details: CheckoutDetails,
    pub items: Vec<OrderItem>,
    /// Locale of the shopper, used for error messages written later.
    pub locale: Locale,
}

impl CheckoutSnapshot {
    /// Sum of the line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A payment row.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub intent_id: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub status: PaymentStatus,
    /// Sanitised, localised failure message.
    pub error_message: Option<String>,
    pub checkout: CheckoutSnapshot,
    pub user_id: Option<UserId>,
    /// Set once the order has been created from this payment.
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the confirmation page polls for.
///
/// The client stops when `order_id` is set, or when `status` is a terminal
/// failure and `error_message` explains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLookup {
    pub status: PaymentStatus,
    pub order_id: Option<OrderId>,
    pub error_message: Option<String>,
}

impl From<&Payment> for PaymentLookup {
    fn from(payment: &Payment) -> Self {
        Self {
            status: payment.status,
            order_id: payment.order_id,
            error_message: payment.error_message.clone(),
        }
    }
}

/// Payments list filter for the admin dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Response to a card checkout: what the client needs to confirm the intent.
#[derive(Debug, Clone, Serialize)]
pub struct CardCheckout {
    pub intent_id: String,
    pub client_secret: String,
    pub publishable_key: String,
}
