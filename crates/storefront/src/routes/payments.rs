//! Payment status polling and the Stripe webhook.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use ballonwerk_core::Locale;

use crate::error::{AppError, LocalizedError, Result};
use crate::middleware::RequestLocale;
use crate::models::payment::PaymentLookup;
use crate::services::payments::PaymentError;
use crate::services::payments::webhook::{parse_event, verify_signature};
use crate::state::AppState;

/// Header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments/{intent_id}", get(lookup))
        .route("/webhooks/stripe", post(webhook))
}

/// Current state of a card payment, polled by the confirmation page.
///
/// The client stops polling once `order_id` is set, or once `status` is a
/// terminal failure with an `error_message`.
#[instrument(skip(state, session))]
pub async fn lookup(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    session: Session,
    Path(intent_id): Path<String>,
) -> Result<Json<PaymentLookup>> {
    let lookup = state
        .payments()
        .lookup(&intent_id, &session)
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(Json(lookup))
}

/// Receive a Stripe webhook.
///
/// Signature failures are rejected with `400`. Events for intents this shop
/// did not create are acknowledged so Stripe stops retrying them. Database
/// errors return `500` so Stripe retries later.
#[instrument(skip_all, fields(event_id))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: String,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Stripe-Signature header".to_string()))?;

    verify_signature(
        &state.config().stripe.webhook_secret,
        signature,
        &payload,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook");
        AppError::BadRequest(e.to_string())
    })?;

    let (event_id, event) =
        parse_event(&payload).map_err(|e| AppError::BadRequest(e.to_string()))?;
    tracing::Span::current().record("event_id", event_id.as_str());

    match state.payments().handle_event(event).await {
        Ok(Some(payment)) => {
            tracing::info!(
                %event_id,
                intent_id = %payment.intent_id,
                status = %payment.status,
                "Webhook applied"
            );
            Ok(StatusCode::OK)
        }
        Ok(None) => Ok(StatusCode::OK),
        Err(PaymentError::NotFound) => {
            tracing::warn!(%event_id, "Webhook for unknown payment intent");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(%event_id, error = %e, "Webhook handling failed");
            Err(e.localize(Locale::default()))
        }
    }
}
