//! Catalog API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use ballonwerk_core::ProductId;

use crate::error::Result;
use crate::models::product::{CategoryCount, Page, PersonalizationOptions, Product, ProductQuery};
use crate::services::storage::{ImageTransform, MediaStore};
use crate::state::AppState;

/// Build the catalog API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index))
        .route("/api/products/{id}", get(show))
        .route("/api/categories", get(categories))
}

/// A product as returned by the API, with public image URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub category_group: String,
    pub in_stock: bool,
    pub available_quantity: Option<u32>,
    pub personalization: PersonalizationOptions,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
    pub sold_count: i32,
}

impl ProductResponse {
    /// Convert a product, resolving image keys to URLs.
    #[must_use]
    pub fn new(product: Product, media: &MediaStore) -> Self {
        Self {
            available_quantity: product.available_quantity(),
            in_stock: product.is_available(),
            thumbnail: product
                .image_keys
                .first()
                .map(|key| media.url(key, ImageTransform::CARD)),
            images: product
                .image_keys
                .iter()
                .map(|key| media.url(key, ImageTransform::LARGE))
                .collect(),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            category_group: product.category_group,
            personalization: product.personalization,
            colors: product.colors,
            sold_count: product.sold_count,
        }
    }
}

/// List products with filters, sort and pagination.
///
/// `GET /api/products?category=&category_group=&search=&min_price=&max_price=&color=&in_stock_only=&sort=&page=&per_page=`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<ProductResponse>>> {
    let (filter, sort, page) = query.into_parts();
    let products = state.catalog().list(filter, sort, page).await?;

    let media = state.media();
    Ok(Json(
        (*products).clone().map(|p| ProductResponse::new(p, media)),
    ))
}

/// Get a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog().get(ProductId::new(id)).await?;
    Ok(Json(ProductResponse::new(product, state.media())))
}

/// Category groups and categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let categories = state.catalog().categories().await?;
    Ok(Json(categories.as_ref().clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::models::product::tests::product;

    #[test]
    fn test_response_resolves_image_urls() {
        let media = MediaStore::new(&MediaConfig {
            dir: "./media".into(),
            cdn_url: Some("https://ik.example.net/bw".to_string()),
        });
        let mut p = product(3, "4.50", Some(0));
        p.image_keys = vec!["products/a.png".to_string()];

        let response = ProductResponse::new(p, &media);
        assert_eq!(response.available_quantity, Some(0));
        assert!(!response.in_stock);
        assert_eq!(
            response.thumbnail.as_deref(),
            Some("https://ik.example.net/bw/tr:w-600,h-600,q-80,f-webp/products/a.png")
        );
        assert_eq!(response.images.len(), 1);
    }
}
