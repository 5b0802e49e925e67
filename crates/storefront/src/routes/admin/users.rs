//! User management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use ballonwerk_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{Page, PageRequest};
use crate::routes::account::AccountResponse;
use crate::state::AppState;

/// Build the user management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/api/users", get(index))
        .route("/admin/api/users/{id}/admin", put(set_admin))
}

/// Page query.
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Admin flag update.
#[derive(Debug, Deserialize)]
pub struct AdminFlag {
    pub is_admin: bool,
}

/// List users.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<AccountResponse>>> {
    let users = state
        .auth()
        .list_users(PageRequest::new(query.page, query.per_page))
        .await?;
    let media = state.media();
    Ok(Json(users.map(|u| AccountResponse::new(u, media))))
}

/// Grant or revoke admin rights.
///
/// Admins cannot revoke their own rights, so the shop always keeps one.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn set_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<AdminFlag>,
) -> Result<Json<AccountResponse>> {
    let user_id = UserId::new(id);
    if user_id == admin.id && !body.is_admin {
        return Err(AppError::Conflict(
            "cannot revoke your own admin rights".to_string(),
        ));
    }

    let user = state.auth().set_admin(user_id, body.is_admin).await?;
    Ok(Json(AccountResponse::new(user, state.media())))
}
