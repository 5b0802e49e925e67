//! Account route handlers.
//!
//! These routes require authentication.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};
use serde::Serialize;
use tracing::instrument;

use ballonwerk_core::{Email, UserId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::models::user::{ProfileUpdate, User};
use crate::services::storage::{ImageTransform, MAX_UPLOAD_BYTES, MediaPrefix, MediaStore};
use crate::state::AppState;

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/account", get(show).patch(update))
        .route(
            "/api/account/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/api/account/orders", get(orders))
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
}

impl AccountResponse {
    /// Convert a user, resolving the avatar key to a URL.
    #[must_use]
    pub fn new(user: User, media: &MediaStore) -> Self {
        Self {
            avatar_url: user
                .avatar_key
                .as_deref()
                .map(|key| media.url(key, ImageTransform::THUMB)),
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            street: user.street,
            city: user.city,
            postal_code: user.postal_code,
            is_admin: user.is_admin,
        }
    }
}

/// Get the profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AccountResponse>> {
    let user = state.auth().get_user(user.id).await?;
    Ok(Json(AccountResponse::new(user, state.media())))
}

/// Update name, phone or address. Absent fields are left as they are.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<AccountResponse>> {
    let user = state.auth().update_profile(user.id, &update).await?;
    Ok(Json(AccountResponse::new(user, state.media())))
}

/// Upload a new avatar (multipart field `file`).
///
/// The previous avatar file is removed once the new one is stored.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Json<AccountResponse>> {
    let (filename, bytes) = read_file_field(multipart).await?;
    let key = state
        .media()
        .save(MediaPrefix::Avatars, &filename, &bytes)
        .await?;

    let auth = state.auth();
    let previous = match auth.set_avatar(user.id, &key).await {
        Ok(previous) => previous,
        Err(e) => {
            // Don't leave an orphaned file behind
            if let Err(cleanup) = state.media().delete(&key).await {
                tracing::warn!(error = %cleanup, %key, "Failed to remove orphaned avatar");
            }
            return Err(e.into());
        }
    };
    if let Some(old) = previous
        && let Err(e) = state.media().delete(&old).await
    {
        tracing::warn!(error = %e, key = %old, "Failed to remove old avatar");
    }

    let user = auth.get_user(user.id).await?;
    Ok(Json(AccountResponse::new(user, state.media())))
}

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// Read the `file` field of a multipart upload.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is malformed or has no `file` field.
pub async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::BadRequest("missing file field".to_string()))
}
