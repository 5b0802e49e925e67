//! Card payment reconciliation.
//!
//! A payment row mirrors a Stripe payment intent. Whichever path learns about
//! a status change first (the signed webhook, the confirmation page polling
//! [`PaymentService::lookup`], or an admin sync) runs the same
//! [`PaymentService::reconcile`]:
//!
//! - `succeeded`: the order is created from the stored checkout snapshot,
//!   at most once per payment;
//! - a failed attempt or cancellation: a sanitised, localised message is
//!   stored for the shopper;
//! - anything else: the status is mirrored.

pub mod decline;
pub mod stripe;
pub mod webhook;

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use ballonwerk_core::{Locale, PaymentStatus, Price};

use crate::db::orders::OrderWriteError;
use crate::db::{PaymentRepository, RepositoryError};
use crate::error::{AppError, LocalizedError};
use crate::models::cart::GuestCart;
use crate::models::payment::{Payment, PaymentLookup};
use crate::models::session_keys;
use crate::services::catalog::CatalogService;

use self::decline::{decline_message, status_message};
use self::stripe::{PaymentIntent, StripeClient, StripeError};
use self::webhook::{WebhookError, WebhookEvent};

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment not found")]
    NotFound,

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// Stripe reports a different amount than the one recorded.
    #[error("amount mismatch for {intent_id}: expected {expected}, got {actual}")]
    AmountMismatch {
        intent_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("order error: {0}")]
    Order(#[from] OrderWriteError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl LocalizedError for PaymentError {
    fn localize(self, _locale: Locale) -> AppError {
        match self {
            Self::NotFound => AppError::NotFound("payment".to_string()),
            Self::Stripe(e) => AppError::Upstream(e.to_string()),
            Self::Webhook(e) => AppError::BadRequest(e.to_string()),
            Self::Repository(e) | Self::Order(OrderWriteError::Repository(e)) => {
                AppError::Database(e)
            }
            Self::Session(e) => AppError::Session(e),
            other @ (Self::AmountMismatch { .. } | Self::Order(_)) => {
                AppError::Internal(other.to_string())
            }
        }
    }
}

/// Payment service.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
    stripe: &'a StripeClient,
    catalog: &'a CatalogService,
}

impl<'a> PaymentService<'a> {
    /// Create a payment service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: &'a StripeClient, catalog: &'a CatalogService) -> Self {
        Self {
            pool,
            stripe,
            catalog,
        }
    }

    fn payments(&self) -> PaymentRepository<'a> {
        PaymentRepository::new(self.pool)
    }

    /// Current state of a payment, as polled by the confirmation page.
    ///
    /// While the payment is unresolved the intent is re-read from Stripe, so
    /// a delayed webhook does not hold the shopper up. Once an order exists
    /// and the intent was started by this session, the guest cart is cleared.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for unknown intents.
    #[instrument(skip(self, session))]
    pub async fn lookup(
        &self,
        intent_id: &str,
        session: &Session,
    ) -> Result<PaymentLookup, PaymentError> {
        let mut payment = self
            .payments()
            .get_by_intent(intent_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if payment.order_id.is_none() && !payment.status.is_final() {
            match self.stripe.retrieve_payment_intent(intent_id).await {
                Ok(intent) => payment = self.reconcile(&intent).await?,
                Err(e) => tracing::warn!(error = %e, "Could not refresh payment intent"),
            }
        }

        if payment.order_id.is_some() {
            clear_pending_checkout(session, intent_id).await?;
        }

        Ok(PaymentLookup::from(&payment))
    }

    /// Re-read an intent from Stripe and reconcile it.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if Stripe cannot be reached, or any
    /// error from [`Self::reconcile`].
    #[instrument(skip(self))]
    pub async fn sync(&self, intent_id: &str) -> Result<Payment, PaymentError> {
        let intent = self.stripe.retrieve_payment_intent(intent_id).await?;
        self.reconcile(&intent).await
    }

    /// Handle a verified webhook event.
    ///
    /// Returns `None` for events the shop does not act on.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::reconcile`].
    pub async fn handle_event(&self, event: WebhookEvent) -> Result<Option<Payment>, PaymentError> {
        match event {
            WebhookEvent::Succeeded(intent)
            | WebhookEvent::PaymentFailed(intent)
            | WebhookEvent::Canceled(intent)
            | WebhookEvent::Processing(intent)
            | WebhookEvent::RequiresAction(intent) => self.reconcile(&intent).await.map(Some),
            WebhookEvent::Other(event_type) => {
                tracing::debug!(event_type, "Ignoring webhook event");
                Ok(None)
            }
        }
    }

    /// Apply the state of a Stripe intent to its payment row.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for intents the shop did not create,
    /// and `PaymentError::AmountMismatch` if a succeeded intent charged a
    /// different amount than recorded.
    #[instrument(skip(self, intent), fields(intent_id = %intent.id, status = %intent.status))]
    pub async fn reconcile(&self, intent: &PaymentIntent) -> Result<Payment, PaymentError> {
        let payment = self
            .payments()
            .get_by_intent(&intent.id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if intent.status == PaymentStatus::Succeeded {
            let expected = Price::new(payment.amount, payment.currency)
                .and_then(|p| p.to_minor_units())
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid amount: {e}")))?;
            if expected != intent.amount {
                tracing::error!(expected, actual = intent.amount, "Payment amount mismatch");
                return Err(PaymentError::AmountMismatch {
                    intent_id: intent.id.clone(),
                    expected,
                    actual: intent.amount,
                });
            }

            let payment = self.payments().materialize_order(&intent.id).await?;
            self.catalog.invalidate_all().await;
            return Ok(payment);
        }

        let (status, message) = outcome(intent, payment.checkout.locale);
        if status == payment.status && message == payment.error_message.as_deref() {
            return Ok(payment);
        }
        if status.is_terminal_failure() {
            tracing::info!(%status, "Payment attempt failed");
        }

        self.payments()
            .update_status(&intent.id, status, message)
            .await?
            .ok_or(PaymentError::NotFound)
    }
}

/// Status and shopper-facing message to record for a non-succeeded intent.
///
/// A failed attempt leaves the intent in `requires_payment_method` with a
/// `last_payment_error`; that is recorded as `failed`.
fn outcome(intent: &PaymentIntent, locale: Locale) -> (PaymentStatus, Option<&'static str>) {
    match (&intent.status, &intent.last_payment_error) {
        (PaymentStatus::RequiresPaymentMethod, Some(error)) => (
            PaymentStatus::Failed,
            Some(decline_message(error.reason()).text(locale)),
        ),
        (status, _) => (*status, status_message(*status).map(|m| m.text(locale))),
    }
}

/// Drop the guest cart once the session's own card checkout has an order.
async fn clear_pending_checkout(session: &Session, intent_id: &str) -> Result<(), PaymentError> {
    let pending: Option<String> = session.get(session_keys::PENDING_PAYMENT).await?;
    if pending.as_deref() == Some(intent_id) {
        session.remove::<GuestCart>(session_keys::GUEST_CART).await?;
        session.remove::<String>(session_keys::PENDING_PAYMENT).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::stripe::PaymentError as IntentError;
    use super::*;
    use crate::i18n::Message;

    fn intent(status: PaymentStatus, error: Option<IntentError>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".to_string(),
            status,
            amount: 1000,
            currency: "eur".to_string(),
            client_secret: None,
            last_payment_error: error,
        }
    }

    #[test]
    fn test_declined_attempt_is_recorded_as_failed() {
        let declined = intent(
            PaymentStatus::RequiresPaymentMethod,
            Some(IntentError {
                code: Some("card_declined".to_string()),
                decline_code: Some("insufficient_funds".to_string()),
                message: Some("Your card has insufficient funds.".to_string()),
            }),
        );
        let (status, message) = outcome(&declined, Locale::De);
        assert_eq!(status, PaymentStatus::Failed);
        assert_eq!(message, Some(Message::InsufficientFunds.text(Locale::De)));
    }

    #[test]
    fn test_fresh_intent_has_no_message() {
        let fresh = intent(PaymentStatus::RequiresPaymentMethod, None);
        assert_eq!(
            outcome(&fresh, Locale::En),
            (PaymentStatus::RequiresPaymentMethod, None)
        );
        let processing = intent(PaymentStatus::Processing, None);
        assert_eq!(
            outcome(&processing, Locale::En),
            (PaymentStatus::Processing, None)
        );
    }

    #[test]
    fn test_canceled_intent_is_explained() {
        let canceled = intent(PaymentStatus::Canceled, None);
        assert_eq!(
            outcome(&canceled, Locale::Uk),
            (
                PaymentStatus::Canceled,
                Some(Message::PaymentCanceled.text(Locale::Uk))
            )
        );
    }

    #[test]
    fn test_provider_errors_are_not_leaked() {
        use axum::response::IntoResponse;

        let err = PaymentError::Stripe(StripeError::Api {
            status: 402,
            code: Some("card_declined".to_string()),
            message: "raw provider text".to_string(),
        });
        let response = err.localize(Locale::En).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);
    }
}
