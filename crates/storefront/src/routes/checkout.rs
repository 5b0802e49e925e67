//! Checkout API handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{LocalizedError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequestLocale};
use crate::models::order::{CheckoutForm, Order};
use crate::models::payment::CardCheckout;
use crate::state::AppState;

/// Build the checkout API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/cash", post(cash))
        .route("/api/checkout/card", post(card))
}

/// Place a cash-on-pickup order.
///
/// Requires `whatsapp_confirmed`. Responds `201` with the confirmed order.
#[instrument(skip(state, session, user, form))]
pub async fn cash(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state
        .checkout()
        .place_cash_order(user.map(|u| u.id), &session, form, locale)
        .await
        .map_err(|e| e.localize(locale))?;

    add_breadcrumb(
        "checkout",
        "Cash order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Start a card payment.
///
/// Returns what the client needs to confirm the payment with Stripe.js.
#[instrument(skip(state, session, user, form))]
pub async fn card(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<CardCheckout>> {
    let checkout = state
        .checkout()
        .start_card_payment(user.map(|u| u.id), &session, form, locale)
        .await
        .map_err(|e| e.localize(locale))?;

    add_breadcrumb(
        "checkout",
        "Card payment started",
        Some(&[("intent_id", &checkout.intent_id)]),
    );
    Ok(Json(checkout))
}
