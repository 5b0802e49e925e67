//! Cart API handlers.
//!
//! The same endpoints serve guests and signed-in shoppers; the cart service
//! picks the session cart or the account cart from the current user.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use ballonwerk_core::ProductId;

use crate::error::{LocalizedError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequestLocale, RequireAuth};
use crate::models::CurrentUser;
use crate::models::cart::{CartView, Personalization};
use crate::services::cart::CartOwner;
use crate::state::AppState;

/// Build the cart API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show).delete(clear))
        .route("/api/cart/items", post(add))
        .route("/api/cart/items/{product_id}", patch(update).delete(remove))
        .route("/api/cart/merge", post(merge))
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub personalization: Option<Personalization>,
}

const fn default_quantity() -> i64 {
    1
}

/// Quantity update request. `0` removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Result of a guest cart merge.
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub merged: usize,
    pub dropped: usize,
    pub cart: CartView,
}

fn owner<'s>(user: Option<&CurrentUser>, session: &'s Session) -> CartOwner<'s> {
    user.map_or(CartOwner::Guest(session), |u| CartOwner::Account(u.id))
}

/// Get the current cart.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let cart = state
        .cart()
        .view(owner(user.as_ref(), &session))
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(Json(cart))
}

/// Add a product to the cart.
#[instrument(skip(state, session, user, body), fields(product_id = body.product_id, quantity = body.quantity))]
pub async fn add(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(body.product_id);
    let cart = state
        .cart()
        .add(
            owner(user.as_ref(), &session),
            product_id,
            body.quantity,
            body.personalization,
        )
        .await
        .map_err(|e| e.localize(locale))?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product_id.to_string())]),
    );
    Ok(Json(cart))
}

/// Set the quantity of a cart line.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(product_id): Path<i32>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = state
        .cart()
        .update_quantity(
            owner(user.as_ref(), &session),
            ProductId::new(product_id),
            body.quantity,
        )
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(Json(cart))
}

/// Remove a cart line.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(product_id): Path<i32>,
) -> Result<Json<CartView>> {
    let cart = state
        .cart()
        .remove(owner(user.as_ref(), &session), ProductId::new(product_id))
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(Json(cart))
}

/// Empty the cart.
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<StatusCode> {
    state
        .cart()
        .clear(owner(user.as_ref(), &session))
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Merge the session's guest cart into the signed-in account.
///
/// Sign-in already merges; this lets a client retry after a failed merge.
/// Once merged the guest cart is gone, so repeated calls change nothing.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn merge(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Json<MergeResponse>> {
    let cart = state.cart();
    let summary = cart
        .merge_guest(user.id, &session)
        .await
        .map_err(|e| e.localize(locale))?;
    let view = cart
        .view(CartOwner::Account(user.id))
        .await
        .map_err(|e| e.localize(locale))?;

    Ok(Json(MergeResponse {
        merged: summary.merged,
        dropped: summary.dropped,
        cart: view,
    }))
}
