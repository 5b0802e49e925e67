//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ballonwerk_core::ProductId;

use super::validation::ValidationErrors;

/// Longest personalization text any product may allow.
pub const MAX_PERSONALIZATION_TEXT: u16 = 60;

/// Personalization a product offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizationOptions {
    /// Whether a custom text (name, age, greeting) can be printed.
    pub allows_text: bool,
    /// Maximum length of the custom text.
    pub max_text_length: u16,
    /// Whether the shopper picks one of the product's colors.
    pub allows_color_choice: bool,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub category_group: String,
    pub in_stock: bool,
    /// Units on hand; `None` for made-to-order products with no stock limit.
    pub stock_quantity: Option<i32>,
    pub personalization: PersonalizationOptions,
    pub colors: Vec<String>,
    pub image_keys: Vec<String>,
    pub sold_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Units that can currently be put in a cart.
    ///
    /// `None` means no stock limit. A product flagged out of stock always
    /// yields `Some(0)`.
    #[must_use]
    pub fn available_quantity(&self) -> Option<u32> {
        if !self.in_stock {
            return Some(0);
        }
        self.stock_quantity
            .map(|q| u32::try_from(q.max(0)).unwrap_or(0))
    }

    /// Whether at least one unit can be ordered.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available_quantity().is_none_or(|q| q > 0)
    }
}

/// Admin input for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub category_group: String,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default)]
    pub personalization: PersonalizationOptions,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub image_keys: Vec<String>,
}

const fn default_true() -> bool {
    true
}

impl ProductInput {
    /// Validate admin input.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name_len = self.name.trim().chars().count();
        if !(2..=120).contains(&name_len) {
            errors.add("name", "must be 2 to 120 characters");
        }
        if self.description.chars().count() > 5000 {
            errors.add("description", "must be at most 5000 characters");
        }
        if self.price.is_sign_negative() || self.price.normalize().scale() > 2 {
            errors.add("price", "must be a non-negative amount with at most 2 decimals");
        }
        if self.category.trim().is_empty() {
            errors.add("category", "is required");
        }
        if self.category_group.trim().is_empty() {
            errors.add("category_group", "is required");
        }
        if self.stock_quantity.is_some_and(|q| q < 0) {
            errors.add("stock_quantity", "cannot be negative");
        }
        if self.personalization.allows_text
            && !(1..=MAX_PERSONALIZATION_TEXT).contains(&self.personalization.max_text_length)
        {
            errors.add(
                "personalization.max_text_length",
                format!("must be between 1 and {MAX_PERSONALIZATION_TEXT}"),
            );
        }
        if self.personalization.allows_color_choice && self.colors.is_empty() {
            errors.add("colors", "color choice requires at least one color");
        }
        if self.colors.iter().any(|c| c.trim().is_empty()) {
            errors.add("colors", "colors cannot be blank");
        }

        errors.into_result()
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Popular,
    Name,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Ties fall back to id for stable pagination.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id DESC",
            Self::Popular => "sold_count DESC, id DESC",
            Self::Name => "lower(name) ASC, id ASC",
        }
    }

    /// Query string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Popular => "popular",
            Self::Name => "name",
        }
    }
}

/// Filters for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub category_group: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub color: Option<String>,
    pub in_stock_only: bool,
}

/// Raw listing query string (`?category=...&sort=price_asc&page=2`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub category_group: Option<String>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub color: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductQuery {
    /// Split into filter, sort and page request, dropping blank values.
    #[must_use]
    pub fn into_parts(self) -> (ProductFilter, ProductSort, PageRequest) {
        let filter = ProductFilter {
            category: non_blank(self.category),
            category_group: non_blank(self.category_group),
            search: non_blank(self.search),
            min_price: self.min_price,
            max_price: self.max_price,
            color: non_blank(self.color),
            in_stock_only: self.in_stock_only,
        };
        (filter, self.sort, PageRequest::new(self.page, self.per_page))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 24;
    pub const MAX_PER_PAGE: u32 = 60;

    /// Normalise optional query values: page ≥ 1, `per_page` in `1..=60`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Wrap query results with pagination metadata.
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let per_page = i64::from(request.per_page);
        let pages = (total.max(0) + per_page - 1) / per_page;
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Convert the items, keeping pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Number of products per category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category_group: String,
    pub category: String,
    pub count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A product with sensible defaults for tests.
    pub(crate) fn product(id: i32, price: &str, stock: Option<i32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Balloon {id}"),
            description: "Foil balloon with helium".to_string(),
            price: price.parse().unwrap(),
            category: "foil".to_string(),
            category_group: "balloons".to_string(),
            in_stock: true,
            stock_quantity: stock,
            personalization: PersonalizationOptions {
                allows_text: true,
                max_text_length: 20,
                allows_color_choice: true,
            },
            colors: vec!["gold".to_string(), "rose".to_string()],
            image_keys: vec![format!("products/{id}.webp")],
            sold_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input() -> ProductInput {
        ProductInput {
            name: "Number balloon".to_string(),
            description: String::new(),
            price: "9.90".parse().unwrap(),
            category: "numbers".to_string(),
            category_group: "balloons".to_string(),
            in_stock: true,
            stock_quantity: Some(4),
            personalization: PersonalizationOptions::default(),
            colors: vec![],
            image_keys: vec![],
        }
    }

    #[test]
    fn test_available_quantity() {
        let mut p = product(1, "5.00", Some(3));
        assert_eq!(p.available_quantity(), Some(3));
        p.stock_quantity = None;
        assert_eq!(p.available_quantity(), None);
        assert!(p.is_available());
        p.in_stock = false;
        assert_eq!(p.available_quantity(), Some(0));
        assert!(!p.is_available());
    }

    #[test]
    fn test_product_input_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.name = " ".to_string();
        bad.price = "-1".parse().unwrap();
        bad.stock_quantity = Some(-2);
        bad.personalization.allows_color_choice = true;
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("price").is_some());
        assert!(errors.get("stock_quantity").is_some());
        assert!(errors.get("colors").is_some());
    }

    #[test]
    fn test_page_request_normalizes() {
        let req = PageRequest::new(Some(0), Some(500));
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, PageRequest::MAX_PER_PAGE);

        let req = PageRequest::new(Some(3), Some(10));
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn test_page_total_pages() {
        let page = Page::new(vec![1, 2], 25, PageRequest::new(Some(1), Some(10)));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());

        let empty: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_query_into_parts_drops_blank_values() {
        let query = ProductQuery {
            category: Some("  ".to_string()),
            search: Some(" herz ".to_string()),
            sort: ProductSort::PriceAsc,
            ..ProductQuery::default()
        };
        let (filter, sort, page) = query.into_parts();
        assert_eq!(filter.category, None);
        assert_eq!(filter.search.as_deref(), Some("herz"));
        assert_eq!(sort, ProductSort::PriceAsc);
        assert_eq!(page, PageRequest::default());
    }
}
