//! Dashboard summary.

use axum::{Json, Router, extract::State, routing::get};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use ballonwerk_core::OrderStatus;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::routes::products::ProductResponse;
use crate::state::AppState;

/// Products with this many units or fewer count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 3;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/api/dashboard", get(summary))
}

/// Orders in one status.
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Dashboard overview.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of order totals past `pending`.
    pub revenue: Decimal,
    pub low_stock: Vec<ProductResponse>,
}

/// Order counts per status, revenue and low-stock products.
#[instrument(skip(state, _admin))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardSummary>> {
    let orders = OrderRepository::new(state.pool());
    let counts = orders.count_by_status().await?;
    let revenue = orders.revenue().await?;
    let low_stock = state.catalog().low_stock(LOW_STOCK_THRESHOLD).await?;

    let media = state.media();
    Ok(Json(DashboardSummary {
        orders_by_status: counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        revenue,
        low_stock: low_stock
            .into_iter()
            .map(|p| ProductResponse::new(p, media))
            .collect(),
    }))
}
