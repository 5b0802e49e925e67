//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::seo::SeoContext;
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::checkout::CheckoutService;
use crate::services::payments::PaymentService;
use crate::services::payments::stripe::StripeClient;
use crate::services::storage::MediaStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    media: MediaStore,
    stripe: StripeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = CatalogService::new(pool.clone());
        let media = MediaStore::new(&config.media);
        let stripe = StripeClient::new(&config.stripe);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                media,
                stripe,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the media store.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Get a reference to the Stripe API client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Site-wide inputs for page metadata.
    #[must_use]
    pub fn seo(&self) -> SeoContext<'_> {
        SeoContext {
            base_url: &self.inner.config.base_url,
            media: &self.inner.media,
            currency: self.inner.config.currency,
        }
    }

    /// Account service for this request.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.pool())
    }

    /// Cart service for this request.
    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.pool(), self.media(), self.config().currency)
    }

    /// Checkout service for this request.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            self.pool(),
            self.media(),
            self.catalog(),
            self.stripe(),
            self.config().currency,
        )
    }

    /// Payment service for this request.
    #[must_use]
    pub fn payments(&self) -> PaymentService<'_> {
        PaymentService::new(self.pool(), self.stripe(), self.catalog())
    }
}
