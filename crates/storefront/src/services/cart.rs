//! Cart operations for signed-in shoppers and guests.
//!
//! Signed-in shoppers' carts live in `storefront.cart_item`; guests keep a
//! [`GuestCart`] in their server session. Every operation takes a
//! [`CartOwner`] and dispatches on it, so handlers never care which one they
//! are talking to.
//!
//! Product data is always read fresh from the database here (not from the
//! catalog cache), since stock decides what may be added.

use std::collections::HashMap;

use axum::http::StatusCode;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use ballonwerk_core::{CurrencyCode, Locale, ProductId, UserId};

use crate::db::cart::MergeSummary;
use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, LocalizedError};
use crate::i18n::Message;
use crate::models::cart::{
    CartView, GuestCart, MAX_LINE_QUANTITY, Personalization, clamp_quantity,
};
use crate::models::product::Product;
use crate::models::session_keys;
use crate::services::storage::{ImageTransform, MediaStore};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,

    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("invalid quantity")]
    InvalidQuantity,

    #[error("personalization not allowed for this product")]
    PersonalizationNotAllowed,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl LocalizedError for CartError {
    fn localize(self, locale: Locale) -> AppError {
        match self {
            Self::ProductNotFound => AppError::user(
                StatusCode::NOT_FOUND,
                "product_not_found",
                Message::ProductNotFound,
                locale,
            ),
            Self::OutOfStock(_) => AppError::user(
                StatusCode::CONFLICT,
                "out_of_stock",
                Message::OutOfStock,
                locale,
            ),
            Self::InvalidQuantity => AppError::user(
                StatusCode::BAD_REQUEST,
                "invalid_quantity",
                Message::InvalidQuantity,
                locale,
            ),
            Self::PersonalizationNotAllowed => AppError::user(
                StatusCode::BAD_REQUEST,
                "personalization_not_allowed",
                Message::PersonalizationNotAllowed,
                locale,
            ),
            Self::Repository(e) => AppError::Database(e),
            Self::Session(e) => AppError::Session(e),
        }
    }
}

/// Whose cart an operation applies to.
#[derive(Clone, Copy)]
pub enum CartOwner<'s> {
    /// Signed-in shopper; cart rows in the database.
    Account(UserId),
    /// Visitor without an account; cart in the session.
    Guest(&'s Session),
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
    media: &'a MediaStore,
    currency: CurrencyCode,
}

impl<'a> CartService<'a> {
    /// Create a cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore, currency: CurrencyCode) -> Self {
        Self {
            pool,
            media,
            currency,
        }
    }

    fn carts(&self) -> CartRepository<'a> {
        CartRepository::new(self.pool)
    }

    fn products(&self) -> ProductRepository<'a> {
        ProductRepository::new(self.pool)
    }

    /// The cart joined with current product data.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` or `CartError::Session` if loading fails.
    pub async fn view(&self, owner: CartOwner<'_>) -> Result<CartView, CartError> {
        let entries = self.entries(owner).await?;
        if entries.is_empty() {
            return Ok(CartView::empty(self.currency));
        }
        Ok(CartView::build(entries, self.currency, |key| {
            self.media.url(key, ImageTransform::THUMB)
        }))
    }

    /// Cart lines as `(product, quantity, personalization)`, in cart order.
    ///
    /// Lines whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` or `CartError::Session` if loading fails.
    pub async fn entries(
        &self,
        owner: CartOwner<'_>,
    ) -> Result<Vec<(Product, u32, Option<Personalization>)>, CartError> {
        let lines: Vec<(ProductId, u32, Option<Personalization>)> = match owner {
            CartOwner::Account(user_id) => self
                .carts()
                .list(user_id)
                .await?
                .into_iter()
                .map(|item| {
                    (
                        item.product_id,
                        u32::try_from(item.quantity).unwrap_or(0),
                        item.personalization.map(|p| p.0),
                    )
                })
                .collect(),
            CartOwner::Guest(session) => load_guest(session)
                .await?
                .lines
                .into_iter()
                .map(|l| (l.product_id, l.quantity, l.personalization))
                .collect(),
        };
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = lines.iter().map(|(id, _, _)| *id).collect();
        let products = self.products().get_many(&ids).await?;
        Ok(join_lines(lines, products))
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// The resulting line quantity is clamped to stock and to
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for non-positive quantities,
    /// `CartError::ProductNotFound`, `CartError::OutOfStock` if the product
    /// cannot be bought, or `CartError::PersonalizationNotAllowed`.
    #[instrument(skip(self, owner, personalization), fields(product_id = %product_id))]
    pub async fn add(
        &self,
        owner: CartOwner<'_>,
        product_id: ProductId,
        quantity: i64,
        personalization: Option<Personalization>,
    ) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self
            .products()
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if !product.is_available() {
            return Err(CartError::OutOfStock(product_id));
        }

        let personalization = personalization.and_then(Personalization::normalized);
        if let Some(p) = &personalization
            && !p.is_allowed_for(&product)
        {
            return Err(CartError::PersonalizationNotAllowed);
        }

        match owner {
            CartOwner::Account(user_id) => {
                let existing = self.carts().quantity_of(user_id, product_id).await?;
                let next = added_quantity(existing, quantity, product.available_quantity());
                self.carts()
                    .upsert(user_id, product_id, next, personalization.as_ref())
                    .await?;
            }
            CartOwner::Guest(session) => {
                let mut cart = load_guest(session).await?;
                let existing = cart.quantity_of(product_id);
                let next = added_quantity(existing, quantity, product.available_quantity());
                cart.set(product_id, next, personalization);
                store_guest(session, &cart).await?;
            }
        }

        self.view(owner).await
    }

    /// Set a line's quantity. `0` removes the line.
    ///
    /// The quantity is clamped to stock; a line for a sold-out product is
    /// removed. A product that is not in the cart is left out of it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for negative quantities and
    /// `CartError::ProductNotFound` if the product no longer exists.
    #[instrument(skip(self, owner), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        owner: CartOwner<'_>,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, CartError> {
        let requested = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)?;

        let existing = match owner {
            CartOwner::Account(user_id) => self.carts().quantity_of(user_id, product_id).await?,
            CartOwner::Guest(session) => load_guest(session).await?.quantity_of(product_id),
        };
        if existing == 0 {
            return self.view(owner).await;
        }

        let next = if requested == 0 {
            0
        } else {
            let product = self
                .products()
                .get(product_id)
                .await?
                .ok_or(CartError::ProductNotFound)?;
            clamp_quantity(requested, product.available_quantity())
        };

        match owner {
            CartOwner::Account(user_id) => {
                if next == 0 {
                    self.carts().remove(user_id, product_id).await?;
                } else {
                    self.carts().set_quantity(user_id, product_id, next).await?;
                }
            }
            CartOwner::Guest(session) => {
                let mut cart = load_guest(session).await?;
                if cart.quantity_of(product_id) > 0 {
                    cart.set(product_id, next, None);
                    store_guest(session, &cart).await?;
                }
            }
        }

        self.view(owner).await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` or `CartError::Session` if the write fails.
    #[instrument(skip(self, owner), fields(product_id = %product_id))]
    pub async fn remove(
        &self,
        owner: CartOwner<'_>,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        match owner {
            CartOwner::Account(user_id) => {
                self.carts().remove(user_id, product_id).await?;
            }
            CartOwner::Guest(session) => {
                let mut cart = load_guest(session).await?;
                if cart.remove(product_id) {
                    store_guest(session, &cart).await?;
                }
            }
        }
        self.view(owner).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` or `CartError::Session` if the write fails.
    pub async fn clear(&self, owner: CartOwner<'_>) -> Result<(), CartError> {
        match owner {
            CartOwner::Account(user_id) => {
                self.carts().clear(user_id).await?;
            }
            CartOwner::Guest(session) => {
                session.remove::<GuestCart>(session_keys::GUEST_CART).await?;
            }
        }
        Ok(())
    }

    /// Merge the session's guest cart into the user's account cart.
    ///
    /// On success the guest cart is removed from the session, so calling this
    /// again is a no-op. On failure the guest cart is left as it was and a
    /// warning is logged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the merge transaction fails, or
    /// `CartError::Session` if the session cannot be read or updated.
    #[instrument(skip(self, session), fields(user_id = %user_id))]
    pub async fn merge_guest(
        &self,
        user_id: UserId,
        session: &Session,
    ) -> Result<MergeSummary, CartError> {
        let guest = load_guest(session).await?;
        if guest.is_empty() {
            return Ok(MergeSummary::default());
        }

        match self.carts().merge_guest(user_id, &guest).await {
            Ok(summary) => {
                session.remove::<GuestCart>(session_keys::GUEST_CART).await?;
                tracing::info!(
                    merged = summary.merged,
                    dropped = summary.dropped,
                    "Merged guest cart"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(error = %e, lines = guest.lines.len(), "Guest cart merge failed");
                Err(e.into())
            }
        }
    }
}

/// Read the guest cart from the session, empty if absent.
async fn load_guest(session: &Session) -> Result<GuestCart, CartError> {
    Ok(session
        .get::<GuestCart>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

/// Write the guest cart back; an empty cart removes the key.
async fn store_guest(session: &Session, cart: &GuestCart) -> Result<(), CartError> {
    if cart.is_empty() {
        session.remove::<GuestCart>(session_keys::GUEST_CART).await?;
    } else {
        session.insert(session_keys::GUEST_CART, cart).await?;
    }
    Ok(())
}

/// Quantity after adding `requested` (> 0) units to `existing`.
fn added_quantity(existing: u32, requested: i64, available: Option<u32>) -> u32 {
    let requested = u32::try_from(requested.min(i64::from(MAX_LINE_QUANTITY))).unwrap_or(0);
    clamp_quantity(existing.saturating_add(requested), available)
}

/// Pair cart lines with their products, keeping cart order.
fn join_lines(
    lines: Vec<(ProductId, u32, Option<Personalization>)>,
    products: Vec<Product>,
) -> Vec<(Product, u32, Option<Personalization>)> {
    let mut by_id: HashMap<ProductId, Product> =
        products.into_iter().map(|p| (p.id, p)).collect();

    lines
        .into_iter()
        .filter(|(_, quantity, _)| *quantity > 0)
        .filter_map(|(id, quantity, personalization)| {
            by_id
                .remove(&id)
                .map(|product| (product, quantity, personalization))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::MediaConfig;
    use crate::models::product::tests::product;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    /// A pool that never connects; only usable on paths that skip the database.
    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost/unused").unwrap()
    }

    fn media() -> MediaStore {
        MediaStore::new(&MediaConfig {
            dir: PathBuf::from("media"),
            cdn_url: None,
        })
    }

    #[tokio::test]
    async fn test_guest_cart_round_trips_through_session() {
        let session = session();
        let mut cart = GuestCart::default();
        cart.set(ProductId::new(4), 2, None);
        cart.set(ProductId::new(7), 1, None);

        store_guest(&session, &cart).await.unwrap();

        assert_eq!(load_guest(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_storing_empty_guest_cart_removes_key() {
        let session = session();
        let mut cart = GuestCart::default();
        cart.set(ProductId::new(4), 2, None);
        store_guest(&session, &cart).await.unwrap();

        cart.remove(ProductId::new(4));
        store_guest(&session, &cart).await.unwrap();

        let stored = session
            .get::<GuestCart>(session_keys::GUEST_CART)
            .await
            .unwrap();
        assert!(stored.is_none());
        assert!(load_guest(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_rejects_negative_for_guest() {
        let (pool, media, session) = (lazy_pool(), media(), session());
        let service = CartService::new(&pool, &media, CurrencyCode::EUR);

        let result = service
            .update_quantity(CartOwner::Guest(&session), ProductId::new(4), -1)
            .await;

        assert!(matches!(result, Err(CartError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn test_update_quantity_does_not_add_absent_line() {
        let (pool, media, session) = (lazy_pool(), media(), session());
        let service = CartService::new(&pool, &media, CurrencyCode::EUR);

        let view = service
            .update_quantity(CartOwner::Guest(&session), ProductId::new(4), 3)
            .await
            .unwrap();

        assert_eq!(view.item_count, 0);
        assert!(view.lines.is_empty());
        assert!(load_guest(&session).await.unwrap().is_empty());
    }

    #[test]
    fn test_added_quantity_clamps_to_stock() {
        assert_eq!(added_quantity(2, 3, Some(4)), 4);
        assert_eq!(added_quantity(0, 1, Some(4)), 1);
        assert_eq!(added_quantity(0, 5, None), 5);
    }

    #[test]
    fn test_added_quantity_caps_line_size() {
        assert_eq!(added_quantity(90, 50, None), MAX_LINE_QUANTITY);
        assert_eq!(added_quantity(0, i64::MAX, None), MAX_LINE_QUANTITY);
        assert_eq!(added_quantity(u32::MAX, 1, None), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_join_lines_keeps_cart_order_and_skips_missing() {
        let lines = vec![
            (ProductId::new(3), 1, None),
            (ProductId::new(9), 2, None),
            (ProductId::new(1), 4, None),
        ];
        let products = vec![product(1, "5.00", None), product(3, "2.50", Some(10))];

        let joined = join_lines(lines, products);
        let ids: Vec<i32> = joined.iter().map(|(p, _, _)| p.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(joined[1].1, 4);
    }

    #[test]
    fn test_cart_errors_map_to_statuses() {
        use axum::response::IntoResponse;

        let status = |e: CartError| e.localize(Locale::En).into_response().status();
        assert_eq!(status(CartError::OutOfStock(ProductId::new(1))), StatusCode::CONFLICT);
        assert_eq!(status(CartError::InvalidQuantity), StatusCode::BAD_REQUEST);
        assert_eq!(status(CartError::ProductNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(CartError::Repository(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
