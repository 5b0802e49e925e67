//! `robots.txt`, `sitemap.xml` and page metadata for client-rendered pages.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use ballonwerk_core::{Locale, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::seo::{self, Metadata, PageKind, SeoPage, robots, sitemap};
use crate::state::AppState;

/// Build the SEO router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap_xml))
        .route("/api/seo/metadata", get(page_metadata))
}

/// `GET /robots.txt`
pub async fn robots_txt(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots::robots_txt(&state.config().base_url),
    )
}

/// `GET /sitemap.xml`
#[instrument(skip(state))]
pub async fn sitemap_xml(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let entries = ProductRepository::new(state.pool())
        .sitemap_entries()
        .await?;
    let body = sitemap::SitemapTemplate {
        urls: sitemap::sitemap_urls(&state.config().base_url, &entries),
    }
    .render()
    .map_err(|e| AppError::Internal(format!("sitemap render failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body))
}

/// Metadata query.
#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    #[serde(default)]
    pub locale: Locale,
    pub page: PageKind,
    pub category: Option<String>,
    pub product_id: Option<i32>,
}

/// `GET /api/seo/metadata?locale=en&page=product&product_id=7`
///
/// Head tags for pages the client renders itself.
#[instrument(skip(state))]
pub async fn page_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<Metadata>> {
    let ctx = state.seo();
    let metadata = match query.page {
        PageKind::Home => seo::metadata(&ctx, query.locale, SeoPage::Home),
        PageKind::Catalog => seo::metadata(
            &ctx,
            query.locale,
            SeoPage::Catalog {
                category: query.category.as_deref().filter(|c| !c.is_empty()),
            },
        ),
        PageKind::Product => {
            let id = query
                .product_id
                .ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))?;
            let product = state.catalog().get(ProductId::new(id)).await?;
            seo::metadata(&ctx, query.locale, SeoPage::Product(&product))
        }
        PageKind::Cart => seo::metadata(&ctx, query.locale, SeoPage::Cart),
        PageKind::Checkout => seo::metadata(&ctx, query.locale, SeoPage::Checkout),
        PageKind::Profile => seo::metadata(&ctx, query.locale, SeoPage::Profile),
    };
    Ok(Json(metadata))
}
