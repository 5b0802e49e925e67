//! Checkout: turning a cart into an order.
//!
//! Cash on pickup creates the order straight away (after the shopper agreed
//! to be contacted on WhatsApp). Card checkout only starts a payment intent;
//! the order is created once the payment succeeds, see
//! [`crate::services::payments`].

use axum::http::StatusCode;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use ballonwerk_core::{CurrencyCode, Locale, PaymentMethod, Price, PriceError, ProductId, UserId};

use crate::db::orders::{NewOrder, OrderWriteError};
use crate::db::{OrderRepository, PaymentRepository, RepositoryError};
use crate::error::{AppError, LocalizedError};
use crate::i18n::Message;
use crate::models::ValidationErrors;
use crate::models::cart::{GuestCart, Personalization};
use crate::models::order::{CheckoutForm, Order, OrderItem};
use crate::models::payment::{CardCheckout, CheckoutSnapshot};
use crate::models::product::Product;
use crate::models::session_keys;
use crate::services::cart::{CartError, CartOwner, CartService};
use crate::services::catalog::CatalogService;
use crate::services::payments::stripe::{StripeClient, StripeError};
use crate::services::storage::MediaStore;

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("cart is empty")]
    CartEmpty,

    #[error("WhatsApp confirmation required for cash orders")]
    WhatsappConfirmationRequired,

    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("invalid order total: {0}")]
    Amount(#[from] PriceError),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<OrderWriteError> for CheckoutError {
    fn from(e: OrderWriteError) -> Self {
        match e {
            OrderWriteError::InsufficientStock(id) => Self::OutOfStock(id),
            OrderWriteError::Repository(e) => Self::Repository(e),
            OrderWriteError::InvalidTransition { .. } => {
                Self::Repository(RepositoryError::DataCorruption(e.to_string()))
            }
        }
    }
}

impl LocalizedError for CheckoutError {
    fn localize(self, locale: Locale) -> AppError {
        match self {
            Self::Validation(errors) => AppError::Validation(errors),
            Self::CartEmpty => AppError::user(
                StatusCode::BAD_REQUEST,
                "cart_empty",
                Message::CartEmpty,
                locale,
            ),
            Self::WhatsappConfirmationRequired => AppError::user(
                StatusCode::BAD_REQUEST,
                "whatsapp_confirmation_required",
                Message::WhatsappConfirmationRequired,
                locale,
            ),
            Self::OutOfStock(_) => AppError::user(
                StatusCode::CONFLICT,
                "out_of_stock",
                Message::OutOfStock,
                locale,
            ),
            Self::Amount(e) => AppError::Internal(e.to_string()),
            Self::Stripe(e) => AppError::Upstream(e.to_string()),
            Self::Cart(e) => e.localize(locale),
            Self::Repository(e) => AppError::Database(e),
            Self::Session(e) => AppError::Session(e),
        }
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    media: &'a MediaStore,
    catalog: &'a CatalogService,
    stripe: &'a StripeClient,
    currency: CurrencyCode,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        media: &'a MediaStore,
        catalog: &'a CatalogService,
        stripe: &'a StripeClient,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            pool,
            media,
            catalog,
            stripe,
            currency,
        }
    }

    /// Place a cash-on-pickup order for the current cart.
    ///
    /// The order is created as `confirmed`, stock moves in the same
    /// transaction, and the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` with every failing field,
    /// `CheckoutError::WhatsappConfirmationRequired`, `CheckoutError::CartEmpty`
    /// or `CheckoutError::OutOfStock`.
    #[instrument(skip(self, session, form), fields(user_id = ?user_id))]
    pub async fn place_cash_order(
        &self,
        user_id: Option<UserId>,
        session: &Session,
        form: CheckoutForm,
        locale: Locale,
    ) -> Result<Order, CheckoutError> {
        let details = form.validate(locale).map_err(CheckoutError::Validation)?;
        if !details.whatsapp_confirmed {
            return Err(CheckoutError::WhatsappConfirmationRequired);
        }

        let items = self.order_items(owner(user_id, session)).await?;

        let order = OrderRepository::new(self.pool)
            .create(NewOrder {
                user_id,
                items: &items,
                currency: self.currency,
                details: &details,
                payment_method: PaymentMethod::Cash,
                payment_intent_id: None,
            })
            .await?;

        self.catalog.invalidate_all().await;
        if user_id.is_none() {
            session.remove::<GuestCart>(session_keys::GUEST_CART).await?;
        }

        tracing::info!(order_id = %order.id, total = %order.total, "Cash order placed");
        Ok(order)
    }

    /// Start a card payment for the current cart.
    ///
    /// Creates a Stripe payment intent for the cart total and records it with
    /// a snapshot of the checkout, from which the order is created once the
    /// payment succeeds. The cart is kept until then.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation`, `CheckoutError::CartEmpty`,
    /// `CheckoutError::OutOfStock`, or `CheckoutError::Stripe` if the intent
    /// cannot be created.
    #[instrument(skip(self, session, form), fields(user_id = ?user_id))]
    pub async fn start_card_payment(
        &self,
        user_id: Option<UserId>,
        session: &Session,
        form: CheckoutForm,
        locale: Locale,
    ) -> Result<CardCheckout, CheckoutError> {
        let details = form.validate(locale).map_err(CheckoutError::Validation)?;
        let items = self.order_items(owner(user_id, session)).await?;

        let snapshot = CheckoutSnapshot {
            details,
            items,
            locale,
        };
        let total = snapshot.total();
        let amount = Price::new(total, self.currency)?.to_minor_units()?;

        let intent = self
            .stripe
            .create_payment_intent(
                amount,
                self.currency,
                &[
                    ("customer_email", snapshot.details.email.to_string()),
                    ("items", snapshot.items.len().to_string()),
                ],
            )
            .await?;
        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            StripeError::Response("payment intent without client secret".to_string())
        })?;

        PaymentRepository::new(self.pool)
            .create(
                &intent.id,
                total,
                self.currency,
                intent.status,
                &snapshot,
                user_id,
            )
            .await?;
        session
            .insert(session_keys::PENDING_PAYMENT, &intent.id)
            .await?;

        tracing::info!(intent_id = %intent.id, %total, "Card payment started");
        Ok(CardCheckout {
            intent_id: intent.id,
            client_secret,
            publishable_key: self.stripe.publishable_key().to_string(),
        })
    }

    /// Snapshot the cart as order items, checking availability.
    async fn order_items(&self, owner: CartOwner<'_>) -> Result<Vec<OrderItem>, CheckoutError> {
        let entries = CartService::new(self.pool, self.media, self.currency)
            .entries(owner)
            .await?;
        to_order_items(entries)
    }
}

fn owner(user_id: Option<UserId>, session: &Session) -> CartOwner<'_> {
    user_id.map_or(CartOwner::Guest(session), CartOwner::Account)
}

/// Cart entries as order items at current prices.
///
/// Rejects an empty cart and lines the product can no longer fill.
fn to_order_items(
    entries: Vec<(Product, u32, Option<Personalization>)>,
) -> Result<Vec<OrderItem>, CheckoutError> {
    if entries.is_empty() {
        return Err(CheckoutError::CartEmpty);
    }

    entries
        .into_iter()
        .map(|(product, quantity, personalization)| {
            let fits = product
                .available_quantity()
                .is_none_or(|available| quantity <= available);
            if !product.is_available() || !fits {
                return Err(CheckoutError::OutOfStock(product.id));
            }
            Ok(OrderItem {
                product_id: product.id,
                name: product.name,
                quantity,
                price: product.price,
                personalization,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::product::tests::product;

    #[test]
    fn test_empty_cart_is_rejected() {
        assert!(matches!(
            to_order_items(Vec::new()),
            Err(CheckoutError::CartEmpty)
        ));
    }

    #[test]
    fn test_order_items_snapshot_prices() {
        let items = to_order_items(vec![
            (product(1, "3.20", Some(5)), 2, None),
            (product(2, "10.00", None), 1, None),
        ])
        .unwrap();
        let total: Decimal = items.iter().map(OrderItem::line_total).sum();
        assert_eq!(total, "16.40".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_sold_out_line_is_rejected() {
        let mut sold_out = product(4, "2.00", Some(0));
        sold_out.in_stock = false;
        assert!(matches!(
            to_order_items(vec![(sold_out, 1, None)]),
            Err(CheckoutError::OutOfStock(id)) if id == ProductId::new(4)
        ));
        assert!(matches!(
            to_order_items(vec![(product(5, "2.00", Some(2)), 3, None)]),
            Err(CheckoutError::OutOfStock(_))
        ));
    }

    #[test]
    fn test_checkout_errors_are_localised() {
        use axum::response::IntoResponse;

        let response = CheckoutError::WhatsappConfirmationRequired
            .localize(Locale::Ru)
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = CheckoutError::Validation(ValidationErrors::new())
            .localize(Locale::De)
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
