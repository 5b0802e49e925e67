//! Account cart repository.

use sqlx::types::Json;
use sqlx::PgPool;

use ballonwerk_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::cart::{CartItem, GuestCart, Personalization, clamp_quantity};
use crate::models::product::Product;

/// Outcome of merging a guest cart into an account cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Lines written to the account cart.
    pub merged: usize,
    /// Lines dropped because the product is gone or sold out.
    pub dropped: usize,
}

/// Repository for account cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines of a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as(
            r"
            SELECT id, user_id, product_id, quantity, personalization
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Quantity of a product in the user's cart, `0` if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<u32, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity.map_or(0, |q| u32::try_from(q).unwrap_or(0)))
    }

    /// Set a line's quantity, inserting it if needed.
    ///
    /// `personalization` replaces the stored one only when `Some`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        personalization: Option<&Personalization>,
    ) -> Result<(), RepositoryError> {
        upsert_line(self.pool, user_id, product_id, quantity, personalization).await
    }

    /// Change the quantity of an existing line. Returns whether a line was
    /// updated; an absent line is not inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let quantity = i32::try_from(quantity)
            .map_err(|_| RepositoryError::DataCorruption("cart quantity out of range".to_owned()))?;

        let result = sqlx::query(
            r"
            UPDATE storefront.cart_item
            SET quantity = $3, updated_at = NOW()
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a product's line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line of a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Merge a guest cart into the user's cart in one transaction.
    ///
    /// Quantities are added per product and clamped to stock; lines for
    /// missing or sold-out products are dropped. Nothing is written unless
    /// every line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn merge_guest(
        &self,
        user_id: UserId,
        guest: &GuestCart,
    ) -> Result<MergeSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = MergeSummary::default();

        for line in &guest.lines {
            let product: Option<ProductRow> = sqlx::query_as(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1 FOR SHARE"
            ))
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(product) = product.map(Product::from) else {
                summary.dropped += 1;
                continue;
            };

            let existing: Option<i32> = sqlx::query_scalar(
                r"
                SELECT quantity FROM storefront.cart_item
                WHERE user_id = $1 AND product_id = $2
                FOR UPDATE
                ",
            )
            .bind(user_id)
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let existing = existing.map_or(0, |q| u32::try_from(q).unwrap_or(0));
            let quantity = clamp_quantity(
                existing.saturating_add(line.quantity),
                product.available_quantity(),
            );
            if quantity == 0 {
                summary.dropped += 1;
                continue;
            }

            let personalization = line
                .personalization
                .as_ref()
                .filter(|p| p.is_allowed_for(&product));
            upsert_line(&mut *tx, user_id, line.product_id, quantity, personalization).await?;
            summary.merged += 1;
        }

        tx.commit().await?;
        Ok(summary)
    }
}

async fn upsert_line<'e, E>(
    executor: E,
    user_id: UserId,
    product_id: ProductId,
    quantity: u32,
    personalization: Option<&Personalization>,
) -> Result<(), RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    let quantity = i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption("cart quantity out of range".to_owned()))?;

    sqlx::query(
        r"
        INSERT INTO storefront.cart_item (user_id, product_id, quantity, personalization)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id) DO UPDATE
        SET quantity = EXCLUDED.quantity,
            personalization = COALESCE(EXCLUDED.personalization, storefront.cart_item.personalization),
            updated_at = NOW()
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(personalization.map(Json))
    .execute(executor)
    .await?;

    Ok(())
}
