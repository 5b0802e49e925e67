//! Payment repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use ballonwerk_core::{CurrencyCode, OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

use super::RepositoryError;
use super::orders::{NewOrder, OrderWriteError, StockPolicy, insert_order};
use crate::models::payment::{CheckoutSnapshot, Payment};
use crate::models::product::{Page, PageRequest};

const PAYMENT_COLUMNS: &str = "id, intent_id, amount, currency, status, error_message, checkout, \
     user_id, order_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    intent_id: String,
    amount: Decimal,
    currency: String,
    status: PaymentStatus,
    error_message: Option<String>,
    checkout: Json<CheckoutSnapshot>,
    user_id: Option<i32>,
    order_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Self {
            id: PaymentId::new(row.id),
            intent_id: row.intent_id,
            amount: row.amount,
            currency,
            status: row.status,
            error_message: row.error_message,
            checkout: row.checkout.0,
            user_id: row.user_id.map(UserId::new),
            order_id: row.order_id.map(OrderId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a freshly created payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the intent is already recorded.
    pub async fn create(
        &self,
        intent_id: &str,
        amount: Decimal,
        currency: CurrencyCode,
        status: PaymentStatus,
        checkout: &CheckoutSnapshot,
        user_id: Option<UserId>,
    ) -> Result<Payment, RepositoryError> {
        let row: PaymentRow = sqlx::query_as(&format!(
            r"
            INSERT INTO storefront.payment (intent_id, amount, currency, status, checkout, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(intent_id)
        .bind(amount)
        .bind(currency.code())
        .bind(status)
        .bind(Json(checkout))
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "payment"))?;

        row.try_into()
    }

    /// Get a payment by its provider intent ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_intent(&self, intent_id: &str) -> Result<Option<Payment>, RepositoryError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM storefront.payment WHERE intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List payments, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> Result<Page<Payment>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM storefront.payment \
             WHERE ($1::storefront.payment_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM storefront.payment
            WHERE ($1::storefront.payment_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Payment>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    /// Record a non-success status reported by the provider.
    ///
    /// Succeeded payments are never downgraded, so late or replayed events
    /// cannot undo a completed order. Returns `None` if the intent is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        intent_id: &str,
        status: PaymentStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Payment>, RepositoryError> {
        sqlx::query(
            r"
            UPDATE storefront.payment
            SET status = $2, error_message = $3, updated_at = NOW()
            WHERE intent_id = $1 AND status <> 'succeeded'
            ",
        )
        .bind(intent_id)
        .bind(status)
        .bind(error_message)
        .execute(self.pool)
        .await?;

        self.get_by_intent(intent_id).await
    }

    /// Create the order for a succeeded payment, at most once.
    ///
    /// The payment row is locked for the whole transaction. If an order was
    /// already created, the payment is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the intent is unknown.
    pub async fn materialize_order(&self, intent_id: &str) -> Result<Payment, OrderWriteError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM storefront.payment WHERE intent_id = $1 FOR UPDATE"
        ))
        .bind(intent_id)
        .fetch_optional(&mut *tx)
        .await?;
        let payment: Payment = row.ok_or(RepositoryError::NotFound)?.try_into()?;

        if payment.order_id.is_some() {
            tx.rollback().await?;
            return Ok(payment);
        }

        let snapshot = &payment.checkout;
        let order = insert_order(
            &mut tx,
            NewOrder {
                user_id: payment.user_id,
                items: &snapshot.items,
                currency: payment.currency,
                details: &snapshot.details,
                payment_method: PaymentMethod::Card,
                payment_intent_id: Some(intent_id),
            },
            StockPolicy::BestEffort,
        )
        .await?;

        let row: PaymentRow = sqlx::query_as(&format!(
            r"
            UPDATE storefront.payment
            SET status = 'succeeded', error_message = NULL, order_id = $2, updated_at = NOW()
            WHERE intent_id = $1
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(intent_id)
        .bind(order.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            intent_id,
            order_id = %order.id,
            "Created order from succeeded payment"
        );
        Ok(row.try_into()?)
    }
}
