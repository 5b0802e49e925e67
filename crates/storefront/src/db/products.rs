//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use ballonwerk_core::ProductId;

use super::RepositoryError;
use crate::models::product::{
    CategoryCount, Page, PageRequest, PersonalizationOptions, Product, ProductFilter, ProductInput,
    ProductSort,
};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price, category, category_group, \
     in_stock, stock_quantity, personalization, colors, image_keys, sold_count, created_at, updated_at";

/// Shared `WHERE` clause for listing and counting; binds `$1..=$7`.
const FILTER_CLAUSE: &str = r"
    ($1::text IS NULL OR category = $1)
    AND ($2::text IS NULL OR category_group = $2)
    AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
    AND ($4::numeric IS NULL OR price >= $4)
    AND ($5::numeric IS NULL OR price <= $5)
    AND ($6::text IS NULL OR $6 = ANY(colors))
    AND (NOT $7 OR (in_stock AND (stock_quantity IS NULL OR stock_quantity > 0)))
";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    category_group: String,
    in_stock: bool,
    stock_quantity: Option<i32>,
    personalization: Json<PersonalizationOptions>,
    colors: Vec<String>,
    image_keys: Vec<String>,
    sold_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            category_group: row.category_group,
            in_stock: row.in_stock,
            stock_quantity: row.stock_quantity,
            personalization: row.personalization.0,
            colors: row.colors,
            image_keys: row.image_keys,
            sold_count: row.sold_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escape `LIKE` wildcards so search input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, sorted and paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let search = filter.search.as_deref().map(escape_like);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM storefront.product WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.category_group.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.color.as_deref())
        .bind(filter.in_stock_only)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE {FILTER_CLAUSE} \
             ORDER BY {} LIMIT $8 OFFSET $9",
            sort.order_by()
        ))
        .bind(filter.category.as_deref())
        .bind(filter.category_group.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.color.as_deref())
        .bind(filter.in_stock_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            total,
            page,
        ))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get several products by ID. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Distinct categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query_as(
            r"
            SELECT category_group, category, COUNT(*) AS count
            FROM storefront.product
            GROUP BY category_group, category
            ORDER BY category_group, category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// IDs and last modification times of every product, for the sitemap.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sitemap_entries(
        &self,
    ) -> Result<Vec<(ProductId, DateTime<Utc>)>, RepositoryError> {
        let rows: Vec<(i32, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, updated_at FROM storefront.product ORDER BY id")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, updated_at)| (ProductId::new(id), updated_at))
            .collect())
    }

    /// Products with a stock limit at or below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product \
             WHERE stock_quantity IS NOT NULL AND stock_quantity <= $1 \
             ORDER BY stock_quantity ASC, name ASC"
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO storefront.product
                (name, description, price, category, category_group, in_stock,
                 stock_quantity, personalization, colors, image_keys)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.trim())
        .bind(input.category_group.trim())
        .bind(input.in_stock)
        .bind(input.stock_quantity)
        .bind(Json(&input.personalization))
        .bind(&input.colors)
        .bind(&input.image_keys)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a product's editable fields. `sold_count` is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE storefront.product
            SET name = $2, description = $3, price = $4, category = $5,
                category_group = $6, in_stock = $7, stock_quantity = $8,
                personalization = $9, colors = $10, image_keys = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.trim())
        .bind(input.category_group.trim())
        .bind(input.in_stock)
        .bind(input.stock_quantity)
        .bind(Json(&input.personalization))
        .bind(&input.colors)
        .bind(&input.image_keys)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Append an uploaded image key to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_image(&self, id: ProductId, key: &str) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE storefront.product
            SET image_keys = array_append(image_keys, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Herz"), "Herz");
    }
}
