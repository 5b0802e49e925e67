//! Catalog reads with an in-process cache, and admin product management.
//!
//! Listings, single products and category counts are cached for 5 minutes.
//! Any product mutation (admin edits, stock movement from orders) clears the
//! whole cache, since a single change can affect every listing.
//!
//! Each invalidation bumps a generation counter. A read that started before
//! an invalidation does not leave its result in the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};

use ballonwerk_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::ValidationErrors;
use crate::models::product::{
    CategoryCount, Page, PageRequest, Product, ProductFilter, ProductInput, ProductSort,
};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found")]
    NotFound,

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    List {
        filter: ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    },
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    List(Arc<Page<Product>>),
    Categories(Arc<Vec<CategoryCount>>),
}

/// Catalog service. Cheap to clone.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
    generation: AtomicU64,
}

impl CatalogService {
    /// Create a catalog service over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                cache,
                generation: AtomicU64::new(0),
            }),
        }
    }

    fn repo(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Cache a value read at `generation`, unless the cache was invalidated
    /// since.
    async fn store(&self, key: CacheKey, value: CacheValue, generation: u64) {
        self.inner.cache.insert(key.clone(), value).await;
        if self.generation() != generation {
            self.inner.cache.invalidate(&key).await;
        }
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Arc<Page<Product>>, CatalogError> {
        let cache_key = CacheKey::List {
            filter: filter.clone(),
            sort,
            page,
        };
        if let Some(CacheValue::List(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let generation = self.generation();
        let products = Arc::new(self.repo().list(&filter, sort, page).await?);
        self.store(cache_key, CacheValue::List(Arc::clone(&products)), generation)
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let generation = self.generation();
        let product = self.repo().get(id).await?.ok_or(CatalogError::NotFound)?;
        self.store(cache_key, CacheValue::Product(Box::new(product.clone())), generation)
            .await;

        Ok(product)
    }

    /// Category counts for navigation and filters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<CategoryCount>>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let generation = self.generation();
        let categories = Arc::new(self.repo().categories().await?);
        self.store(
            CacheKey::Categories,
            CacheValue::Categories(Arc::clone(&categories)),
            generation,
        )
        .await;

        Ok(categories)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid input.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, CatalogError> {
        input.validate().map_err(CatalogError::Validation)?;
        let product = self.repo().create(input).await?;
        self.invalidate_all().await;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid input and
    /// `CatalogError::NotFound` if the product doesn't exist.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, CatalogError> {
        input.validate().map_err(CatalogError::Validation)?;
        let product = self.repo().update(id, input).await.map_err(not_found)?;
        self.invalidate_all().await;
        Ok(product)
    }

    /// Attach an uploaded image to a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn add_image(&self, id: ProductId, key: &str) -> Result<Product, CatalogError> {
        let product = self.repo().add_image(id, key).await.map_err(not_found)?;
        self.invalidate_all().await;
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.repo().delete(id).await? {
            return Err(CatalogError::NotFound);
        }
        self.invalidate_all().await;
        tracing::info!("Product deleted");
        Ok(())
    }

    /// Products with at most `threshold` units left. Not cached.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, CatalogError> {
        Ok(self.repo().low_stock(threshold).await?)
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn not_found(e: RepositoryError) -> CatalogError {
    match e {
        RepositoryError::NotFound => CatalogError::NotFound,
        other => CatalogError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::product;

    fn service() -> CatalogService {
        CatalogService::new(PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    #[tokio::test]
    async fn test_store_keeps_value_from_current_generation() {
        let service = service();
        let key = CacheKey::Product(ProductId::new(1));
        let generation = service.generation();

        let value = CacheValue::Product(Box::new(product(1, "5.00", None)));
        service.store(key.clone(), value, generation).await;

        assert!(service.inner.cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_store_drops_value_read_before_invalidation() {
        let service = service();
        let key = CacheKey::Product(ProductId::new(1));
        let generation = service.generation();

        // A product update lands while the read is in flight
        service.invalidate_all().await;
        let value = CacheValue::Product(Box::new(product(1, "5.00", None)));
        service.store(key.clone(), value, generation).await;

        assert!(service.inner.cache.get(&key).await.is_none());
    }
}
