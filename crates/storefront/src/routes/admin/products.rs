//! Product management.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{post, put},
};
use tracing::instrument;

use ballonwerk_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::product::ProductInput;
use crate::routes::account::read_file_field;
use crate::routes::products::ProductResponse;
use crate::services::storage::{MAX_UPLOAD_BYTES, MediaPrefix};
use crate::state::AppState;

/// Build the product management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/api/products", post(create))
        .route("/admin/api/products/{id}", put(update).delete(delete))
        .route(
            "/admin/api/products/{id}/images",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
}

/// Create a product.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = state.catalog().create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(product, state.media())),
    ))
}

/// Replace a product's editable fields.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog().update(ProductId::new(id), &input).await?;
    Ok(Json(ProductResponse::new(product, state.media())))
}

/// Delete a product and its stored images.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    let product = state.catalog().get(id).await?;
    state.catalog().delete(id).await?;

    for key in &product.image_keys {
        if let Err(e) = state.media().delete(key).await {
            tracing::warn!(error = %e, %key, "Failed to remove product image");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image (multipart field `file`) and append it to the product.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let (filename, bytes) = read_file_field(multipart).await?;
    let key = state
        .media()
        .save(MediaPrefix::Products, &filename, &bytes)
        .await?;

    match state.catalog().add_image(ProductId::new(id), &key).await {
        Ok(product) => Ok((
            StatusCode::CREATED,
            Json(ProductResponse::new(product, state.media())),
        )),
        Err(e) => {
            if let Err(cleanup) = state.media().delete(&key).await {
                tracing::warn!(error = %cleanup, %key, "Failed to remove orphaned image");
            }
            Err(e.into())
        }
    }
}
