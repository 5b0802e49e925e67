//! Order management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use tracing::instrument;

use ballonwerk_core::OrderId;

use crate::db::OrderRepository;
use crate::db::orders::OrderWriteError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::{Order, OrderQuery, StatusUpdate};
use crate::models::product::{Page, PageRequest};
use crate::state::AppState;

/// Build the order management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/api/orders", get(index))
        .route("/admin/api/orders/{id}", get(show))
        .route("/admin/api/orders/{id}/status", patch(update_status))
}

/// List orders, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list(query.status, PageRequest::new(query.page, query.per_page))
        .await?;
    Ok(Json(orders))
}

/// Get one order.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Move an order forward (`pending → confirmed → shipped → delivered`).
///
/// Going back is rejected with `409`.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), body.status)
        .await
        .map_err(|e| match e {
            OrderWriteError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            OrderWriteError::Repository(e) => AppError::Database(e),
            OrderWriteError::InsufficientStock(_) => AppError::Internal(e.to_string()),
        })?;

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}
