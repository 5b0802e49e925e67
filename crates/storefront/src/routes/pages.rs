//! Server-rendered catalog pages.
//!
//! Every page lives under a locale prefix (`/de`, `/en`, `/ru`, `/uk`) and
//! carries full SEO metadata. `/` redirects to the visitor's locale.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use tracing::instrument;
use url::form_urlencoded;

use ballonwerk_core::{Locale, Price, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::i18n::Message;
use crate::middleware::RequestLocale;
use crate::models::product::{PageRequest, Product, ProductFilter, ProductQuery, ProductSort};
use crate::seo::{Metadata, SeoPage, metadata};
use crate::services::storage::{ImageTransform, MediaStore};
use crate::state::AppState;

/// Products shown on the home page.
const FEATURED_COUNT: u32 = 8;

/// Build the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/{locale}", get(home))
        .route("/{locale}/products", get(catalog))
        .route("/{locale}/products/{id}", get(product))
}

// =============================================================================
// View Types
// =============================================================================

/// Localised navigation labels.
#[derive(Debug, Clone, Copy)]
pub struct Nav {
    pub catalog: &'static str,
    pub cart: &'static str,
    pub sold_out: &'static str,
    pub no_results: &'static str,
}

impl Nav {
    const fn new(locale: Locale) -> Self {
        Self {
            catalog: Message::CatalogTitle.text(locale),
            cart: Message::CartTitle.text(locale),
            sold_out: Message::SoldOut.text(locale),
            no_results: Message::NoProducts.text(locale),
        }
    }
}

/// Product tile in a grid.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub available: bool,
}

impl ProductCard {
    fn new(product: &Product, price: String, media: &MediaStore) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price,
            image_url: product
                .image_keys
                .first()
                .map(|key| media.url(key, ImageTransform::CARD)),
            available: product.is_available(),
        }
    }
}

/// Category link in the catalog sidebar.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub name: String,
    pub href: String,
    pub count: i64,
}

/// Full product for the detail page.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub name: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub available: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub meta: Metadata,
    pub nav: Nav,
    pub featured: Vec<ProductCard>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct CatalogTemplate {
    pub meta: Metadata,
    pub nav: Nav,
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
    pub page: u32,
    pub total_pages: u32,
    /// Current filters as `key=value&`, for pagination links.
    pub query_prefix: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub meta: Metadata,
    pub nav: Nav,
    pub product: ProductDetail,
}

// =============================================================================
// Handlers
// =============================================================================

/// Redirect `/` to the visitor's locale.
pub async fn root(RequestLocale(locale): RequestLocale) -> Redirect {
    Redirect::to(&format!("/{locale}"))
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<impl IntoResponse> {
    let locale = parse_locale(&locale)?;

    let filter = ProductFilter {
        in_stock_only: true,
        ..ProductFilter::default()
    };
    let featured = state
        .catalog()
        .list(
            filter,
            ProductSort::Popular,
            PageRequest::new(Some(1), Some(FEATURED_COUNT)),
        )
        .await?;

    Ok(HomeTemplate {
        meta: metadata(&state.seo(), locale, SeoPage::Home),
        nav: Nav::new(locale),
        featured: cards(&state, locale, &featured.items),
    })
}

/// Display the catalog, filtered and paginated.
#[instrument(skip(state))]
pub async fn catalog(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let locale = parse_locale(&locale)?;
    let (filter, sort, page) = query.into_parts();
    let query_prefix = query_prefix(&filter, sort);

    let products = state.catalog().list(filter.clone(), sort, page).await?;
    let categories = state
        .catalog()
        .categories()
        .await?
        .iter()
        .map(|c| CategoryLink {
            href: format!(
                "/{locale}/products?category={}",
                urlencoding::encode(&c.category)
            ),
            name: c.category.clone(),
            count: c.count,
        })
        .collect();

    Ok(CatalogTemplate {
        meta: metadata(
            &state.seo(),
            locale,
            SeoPage::Catalog {
                category: filter.category.as_deref(),
            },
        ),
        nav: Nav::new(locale),
        products: cards(&state, locale, &products.items),
        categories,
        page: products.page,
        total_pages: products.total_pages.max(1),
        query_prefix,
    })
}

/// Display a product.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path((locale, id)): Path<(String, i32)>,
) -> Result<impl IntoResponse> {
    let locale = parse_locale(&locale)?;
    let product = state.catalog().get(ProductId::new(id)).await?;
    let media = state.media();

    let detail = ProductDetail {
        name: product.name.clone(),
        description: product.description.clone(),
        price: format_price(&state, locale, &product),
        images: product
            .image_keys
            .iter()
            .map(|key| media.url(key, ImageTransform::LARGE))
            .collect(),
        colors: product.colors.clone(),
        available: product.is_available(),
    };

    Ok(ProductTemplate {
        meta: metadata(&state.seo(), locale, SeoPage::Product(&product)),
        nav: Nav::new(locale),
        product: detail,
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_locale(segment: &str) -> Result<Locale> {
    segment
        .parse()
        .map_err(|_| AppError::NotFound(format!("page /{segment}")))
}

fn cards(state: &AppState, locale: Locale, products: &[Product]) -> Vec<ProductCard> {
    products
        .iter()
        .map(|p| ProductCard::new(p, format_price(state, locale, p), state.media()))
        .collect()
}

fn format_price(state: &AppState, locale: Locale, product: &Product) -> String {
    Price::new(product.price, state.config().currency)
        .map_or_else(|_| product.price.to_string(), |p| p.display(locale))
}

/// Filters carried over to pagination links, as `key=value&` pairs.
fn query_prefix(filter: &ProductFilter, sort: ProductSort) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(category) = &filter.category {
        query.append_pair("category", category);
    }
    if let Some(group) = &filter.category_group {
        query.append_pair("category_group", group);
    }
    if let Some(search) = &filter.search {
        query.append_pair("search", search);
    }
    if let Some(min) = filter.min_price {
        query.append_pair("min_price", &min.to_string());
    }
    if let Some(max) = filter.max_price {
        query.append_pair("max_price", &max.to_string());
    }
    if let Some(color) = &filter.color {
        query.append_pair("color", color);
    }
    if filter.in_stock_only {
        query.append_pair("in_stock_only", "true");
    }
    if sort != ProductSort::default() {
        query.append_pair("sort", sort.as_str());
    }

    let mut prefix = query.finish();
    if !prefix.is_empty() {
        prefix.push('&');
    }
    prefix
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prefix_keeps_filters() {
        let filter = ProductFilter {
            category: Some("Folienballons & Zahlen".to_string()),
            in_stock_only: true,
            ..ProductFilter::default()
        };
        assert_eq!(
            query_prefix(&filter, ProductSort::PriceAsc),
            "category=Folienballons+%26+Zahlen&in_stock_only=true&sort=price_asc&"
        );
        assert_eq!(
            query_prefix(&ProductFilter::default(), ProductSort::Newest),
            ""
        );
    }

    #[test]
    fn test_unknown_locale_is_not_found() {
        use axum::http::StatusCode;

        assert_eq!(parse_locale("uk").unwrap(), Locale::Uk);
        let err = parse_locale("favicon.ico").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
