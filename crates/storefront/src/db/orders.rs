//! Order repository.
//!
//! Order creation runs in a transaction that also adjusts stock and sold
//! counts, so an order never exists without its stock movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use ballonwerk_core::{
    CurrencyCode, DeliveryType, Email, OrderId, OrderStatus, PaymentMethod, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::order::{CheckoutDetails, Order, OrderItem};
use crate::models::product::{Page, PageRequest};

const ORDER_COLUMNS: &str = "id, user_id, items, total, currency, customer_name, customer_email, \
     customer_phone, street, city, postal_code, delivery_type, payment_method, whatsapp_confirmed, \
     status, payment_intent_id, notes, created_at, updated_at";

/// Errors from writes that check business rules inside the transaction.
#[derive(Debug, thiserror::Error)]
pub enum OrderWriteError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Not enough units left to fulfil a line.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// Status change that would move the order backwards.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<sqlx::Error> for OrderWriteError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: i32,
    user_id: Option<i32>,
    items: Json<Vec<OrderItem>>,
    total: Decimal,
    currency: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    street: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    delivery_type: DeliveryType,
    payment_method: PaymentMethod,
    whatsapp_confirmed: bool,
    status: OrderStatus,
    payment_intent_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&row.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            items: row.items.0,
            total: row.total,
            currency,
            customer_name: row.customer_name,
            customer_email,
            customer_phone: row.customer_phone,
            street: row.street,
            city: row.city,
            postal_code: row.postal_code,
            delivery_type: row.delivery_type,
            payment_method: row.payment_method,
            whatsapp_confirmed: row.whatsapp_confirmed,
            status: row.status,
            payment_intent_id: row.payment_intent_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Everything needed to insert an order row.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder<'a> {
    pub user_id: Option<UserId>,
    pub items: &'a [OrderItem],
    pub currency: CurrencyCode,
    pub details: &'a CheckoutDetails,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: Option<&'a str>,
}

impl NewOrder<'_> {
    fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Distinct products ordered, as database IDs.
    fn product_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.items.iter().map(|i| i.product_id.as_i32()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// How stock shortages are handled when an order is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StockPolicy {
    /// Reject the order (nothing has been charged yet).
    Strict,
    /// Floor stock at zero and log (the customer has already paid).
    BestEffort,
}

/// Insert an order as `confirmed`, move stock and remove the ordered
/// products from the account cart.
///
/// Runs on the caller's transaction.
pub(crate) async fn insert_order(
    conn: &mut PgConnection,
    order: NewOrder<'_>,
    policy: StockPolicy,
) -> Result<Order, OrderWriteError> {
    for item in order.items {
        let quantity = i32::try_from(item.quantity).map_err(|_| {
            RepositoryError::DataCorruption("order quantity out of range".to_owned())
        })?;

        let stock: Option<(bool, Option<i32>)> = sqlx::query_as(
            "SELECT in_stock, stock_quantity FROM storefront.product WHERE id = $1 FOR UPDATE",
        )
        .bind(item.product_id)
        .fetch_optional(&mut *conn)
        .await?;

        let short = match stock {
            None => true,
            Some((in_stock, stock_quantity)) => {
                !in_stock || stock_quantity.is_some_and(|q| q < quantity)
            }
        };
        if short {
            match policy {
                StockPolicy::Strict => {
                    return Err(OrderWriteError::InsufficientStock(item.product_id));
                }
                StockPolicy::BestEffort => {
                    tracing::warn!(
                        product_id = %item.product_id,
                        quantity,
                        "Paid order exceeds available stock"
                    );
                }
            }
        }

        sqlx::query(
            r"
            UPDATE storefront.product
            SET stock_quantity = CASE
                    WHEN stock_quantity IS NULL THEN NULL
                    ELSE GREATEST(stock_quantity - $2, 0)
                END,
                sold_count = sold_count + $2,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(item.product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    }

    let details = order.details;
    let row: OrderRow = sqlx::query_as(&format!(
        r"
        INSERT INTO storefront.order
            (user_id, items, total, currency, customer_name, customer_email, customer_phone,
             street, city, postal_code, delivery_type, payment_method, whatsapp_confirmed,
             status, payment_intent_id, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.user_id)
    .bind(Json(order.items))
    .bind(order.total())
    .bind(order.currency.code())
    .bind(&details.name)
    .bind(details.email.as_str())
    .bind(&details.phone)
    .bind(details.street.as_deref())
    .bind(details.city.as_deref())
    .bind(details.postal_code.as_deref())
    .bind(details.delivery_type)
    .bind(order.payment_method)
    .bind(details.whatsapp_confirmed)
    .bind(OrderStatus::Confirmed)
    .bind(order.payment_intent_id)
    .bind(details.notes.as_deref())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| super::conflict_on_unique(e, "order for this payment"))?;

    // Lines added after checkout started stay in the cart
    if let Some(user_id) = order.user_id {
        sqlx::query(
            "DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = ANY($2)",
        )
        .bind(user_id)
        .bind(order.product_ids())
        .execute(&mut *conn)
        .await?;
    }

    Ok(row.try_into()?)
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order that needs no payment confirmation (cash on pickup).
    ///
    /// # Errors
    ///
    /// Returns `OrderWriteError::InsufficientStock` if a line can no longer be
    /// fulfilled, in which case nothing is written.
    pub async fn create(&self, order: NewOrder<'_>) -> Result<Order, OrderWriteError> {
        let mut tx = self.pool.begin().await?;
        let created = insert_order(&mut tx, order, StockPolicy::Strict).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM storefront.order WHERE ($1::storefront.order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM storefront.order
            WHERE ($1::storefront.order_status IS NULL OR status = $1)
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
            .collect::<Result<Vec<Order>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Move an order to a later status.
    ///
    /// # Errors
    ///
    /// Returns `OrderWriteError::InvalidTransition` if `next` is not after the
    /// current status, and `RepositoryError::NotFound` if the order is absent.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderWriteError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM storefront.order WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(OrderWriteError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let row: OrderRow = sqlx::query_as(&format!(
            "UPDATE storefront.order SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.try_into()?)
    }

    /// Number of orders per status. Statuses without orders are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT status, COUNT(*) FROM storefront.order GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Sum of order totals past `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue(&self) -> Result<Decimal, RepositoryError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(total) FROM storefront.order WHERE status <> 'pending'",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ballonwerk_core::Locale;

    use super::*;
    use crate::models::order::CheckoutForm;

    fn item(product_id: i32, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(product_id),
            name: format!("Balloon {product_id}"),
            quantity,
            price: Decimal::new(450, 2),
            personalization: None,
        }
    }

    fn details() -> CheckoutDetails {
        CheckoutForm {
            name: "Anna Schmidt".to_string(),
            email: "anna@example.de".to_string(),
            phone: "+49 (151) 234-5678".to_string(),
            delivery_type: DeliveryType::Pickup,
            street: None,
            city: None,
            postal_code: None,
            notes: None,
            whatsapp_confirmed: true,
        }
        .validate(Locale::De)
        .unwrap()
    }

    #[test]
    fn test_new_order_product_ids_are_distinct() {
        let items = vec![item(7, 1), item(3, 2), item(7, 4)];
        let details = details();
        let order = NewOrder {
            user_id: Some(UserId::new(1)),
            items: &items,
            currency: CurrencyCode::EUR,
            details: &details,
            payment_method: PaymentMethod::Card,
            payment_intent_id: Some("pi_123"),
        };

        assert_eq!(order.product_ids(), vec![3, 7]);
        assert_eq!(order.total(), Decimal::new(3150, 2));
    }
}
