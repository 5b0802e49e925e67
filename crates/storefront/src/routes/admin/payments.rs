//! Stripe payments overview.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use tracing::instrument;

use crate::db::PaymentRepository;
use crate::error::{LocalizedError, Result};
use crate::middleware::{RequestLocale, RequireAdmin};
use crate::models::payment::{Payment, PaymentQuery};
use crate::models::product::{Page, PageRequest};
use crate::state::AppState;

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/api/payments", get(index))
        .route("/admin/api/payments/{intent_id}/sync", post(sync))
}

/// List payments, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Page<Payment>>> {
    let payments = PaymentRepository::new(state.pool())
        .list(query.status, PageRequest::new(query.page, query.per_page))
        .await?;
    Ok(Json(payments))
}

/// Re-read a payment intent from Stripe and reconcile it, as a webhook would.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn sync(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    RequireAdmin(admin): RequireAdmin,
    Path(intent_id): Path<String>,
) -> Result<Json<Payment>> {
    let payment = state
        .payments()
        .sync(&intent_id)
        .await
        .map_err(|e| e.localize(locale))?;
    Ok(Json(payment))
}
