//! Search-engine metadata.
//!
//! Every public page exists once per [`Locale`] under `/{locale}{path}`.
//! [`metadata`] builds the full head for a page: title, description,
//! canonical URL, hreflang alternates (with `x-default` pointing at German),
//! Open Graph, Twitter card, JSON-LD and the robots directive.

pub mod jsonld;
pub mod robots;
pub mod sitemap;

use serde::{Deserialize, Serialize};

use ballonwerk_core::{CurrencyCode, Locale, ProductId};

use crate::i18n::Message;
use crate::models::product::Product;
use crate::services::storage::{ImageTransform, MediaStore};

/// Site name used in titles and structured data.
pub const SITE_NAME: &str = "Ballonwerk";

/// Longest meta description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 160;

/// Fallback social preview image, relative to the base URL.
const DEFAULT_IMAGE: &str = "/static/images/og-default.jpg";

/// Page kinds with their own metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Catalog,
    Product,
    Cart,
    Checkout,
    Profile,
}

/// A page to describe.
#[derive(Debug, Clone, Copy)]
pub enum SeoPage<'a> {
    Home,
    Catalog { category: Option<&'a str> },
    Product(&'a Product),
    Cart,
    Checkout,
    Profile,
}

impl SeoPage<'_> {
    /// Path below the locale prefix.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => String::new(),
            Self::Catalog { category: None } => "/products".to_string(),
            Self::Catalog {
                category: Some(category),
            } => format!("/products?category={}", urlencoding::encode(category)),
            Self::Product(product) => product_path(product.id),
            Self::Cart => "/cart".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::Profile => "/profile".to_string(),
        }
    }

    const fn is_private(&self) -> bool {
        matches!(self, Self::Cart | Self::Checkout | Self::Profile)
    }
}

/// One hreflang alternate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alternate {
    pub hreflang: &'static str,
    pub href: String,
}

/// Open Graph tags.
#[derive(Debug, Clone, Serialize)]
pub struct OpenGraph {
    #[serde(rename = "type")]
    pub og_type: &'static str,
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_name: &'static str,
    pub locale: &'static str,
    pub alternate_locales: Vec<&'static str>,
    pub image: String,
}

/// Twitter card tags.
#[derive(Debug, Clone, Serialize)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Everything that goes into a page's `<head>`.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub locale: Locale,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub alternates: Vec<Alternate>,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
    pub json_ld: Vec<serde_json::Value>,
    pub robots: &'static str,
}

impl Metadata {
    /// JSON-LD blocks serialised for a `<script type="application/ld+json">` tag.
    ///
    /// `<` is escaped so a value can never close the script element.
    #[must_use]
    pub fn json_ld_scripts(&self) -> Vec<String> {
        self.json_ld
            .iter()
            .map(|v| v.to_string().replace('<', "\\u003c"))
            .collect()
    }
}

/// Site-wide inputs for metadata.
#[derive(Debug, Clone, Copy)]
pub struct SeoContext<'a> {
    /// Public base URL without trailing slash.
    pub base_url: &'a str,
    pub media: &'a MediaStore,
    pub currency: CurrencyCode,
}

/// Build metadata for a page in `locale`.
#[must_use]
pub fn metadata(ctx: &SeoContext<'_>, locale: Locale, page: SeoPage<'_>) -> Metadata {
    let path = page.path();
    let canonical = localized_url(ctx.base_url, locale, &path);

    let title = match page {
        SeoPage::Home => Message::HomeTitle.text(locale).to_string(),
        SeoPage::Catalog {
            category: Some(category),
        } => page_title(category),
        SeoPage::Catalog { category: None } => page_title(Message::CatalogTitle.text(locale)),
        SeoPage::Product(product) => page_title(&product.name),
        SeoPage::Cart => page_title(Message::CartTitle.text(locale)),
        SeoPage::Checkout => page_title(Message::CheckoutTitle.text(locale)),
        SeoPage::Profile => page_title(Message::ProfileTitle.text(locale)),
    };

    let description = match page {
        SeoPage::Catalog { .. } => Message::CatalogDescription.text(locale).to_string(),
        SeoPage::Product(product) if !product.description.trim().is_empty() => {
            truncate_description(&product.description)
        }
        SeoPage::Product(_) => Message::CatalogDescription.text(locale).to_string(),
        _ => Message::SiteDescription.text(locale).to_string(),
    };

    let image = match page {
        SeoPage::Product(product) => product
            .image_keys
            .first()
            .map(|key| absolute_url(ctx.base_url, &ctx.media.url(key, ImageTransform::LARGE))),
        _ => None,
    };
    let og_image = image
        .clone()
        .unwrap_or_else(|| format!("{}{DEFAULT_IMAGE}", ctx.base_url));

    let home = (
        Message::HomeTitle.text(locale).to_string(),
        localized_url(ctx.base_url, locale, ""),
    );
    let catalog = (
        Message::CatalogTitle.text(locale).to_string(),
        localized_url(ctx.base_url, locale, "/products"),
    );
    let json_ld = match page {
        SeoPage::Home => vec![jsonld::store(
            ctx.base_url,
            &description,
            &format!("{}/static/images/logo.png", ctx.base_url),
        )],
        SeoPage::Catalog { category } => {
            let mut trail = vec![home, catalog];
            if let Some(category) = category {
                trail.push((category.to_string(), canonical.clone()));
            }
            vec![jsonld::breadcrumbs(&trail)]
        }
        SeoPage::Product(product) => {
            let category_url = localized_url(
                ctx.base_url,
                locale,
                &SeoPage::Catalog {
                    category: Some(&product.category),
                }
                .path(),
            );
            vec![
                jsonld::product(product, &canonical, image.as_deref(), ctx.currency),
                jsonld::breadcrumbs(&[
                    home,
                    catalog,
                    (product.category.clone(), category_url),
                    (product.name.clone(), canonical.clone()),
                ]),
            ]
        }
        SeoPage::Cart | SeoPage::Checkout | SeoPage::Profile => Vec::new(),
    };

    Metadata {
        locale,
        alternates: alternates(ctx.base_url, &path),
        open_graph: OpenGraph {
            og_type: if matches!(page, SeoPage::Product(_)) {
                "product"
            } else {
                "website"
            },
            title: title.clone(),
            description: description.clone(),
            url: canonical.clone(),
            site_name: SITE_NAME,
            locale: locale.og_locale(),
            alternate_locales: Locale::ALL
                .into_iter()
                .filter(|l| *l != locale)
                .map(Locale::og_locale)
                .collect(),
            image: og_image.clone(),
        },
        twitter: TwitterCard {
            card: "summary_large_image",
            title: title.clone(),
            description: description.clone(),
            image: og_image,
        },
        robots: if page.is_private() {
            "noindex, nofollow"
        } else {
            "index, follow"
        },
        title,
        description,
        canonical,
        json_ld,
    }
}

/// `{base}/{locale}{path}`.
#[must_use]
pub fn localized_url(base_url: &str, locale: Locale, path: &str) -> String {
    format!("{base_url}/{}{path}", locale.code())
}

/// hreflang alternates for every locale, plus `x-default` (German).
#[must_use]
pub fn alternates(base_url: &str, path: &str) -> Vec<Alternate> {
    Locale::ALL
        .into_iter()
        .map(|locale| Alternate {
            hreflang: locale.code(),
            href: localized_url(base_url, locale, path),
        })
        .chain(std::iter::once(Alternate {
            hreflang: "x-default",
            href: localized_url(base_url, Locale::default(), path),
        }))
        .collect()
}

/// Product page path below the locale prefix.
#[must_use]
pub fn product_path(id: ProductId) -> String {
    format!("/products/{id}")
}

fn page_title(page: &str) -> String {
    format!("{page} | {SITE_NAME}")
}

/// Collapse whitespace and cut to [`MAX_DESCRIPTION_CHARS`], ending in `…`.
fn truncate_description(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DESCRIPTION_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_DESCRIPTION_CHARS - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// Make CDN-less `/media/...` URLs absolute for social previews.
fn absolute_url(base_url: &str, url: &str) -> String {
    if url.starts_with('/') {
        format!("{base_url}{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::MediaConfig;
    use crate::models::product::tests::product;

    const BASE: &str = "https://ballonwerk.example";

    fn media() -> MediaStore {
        MediaStore::new(&MediaConfig {
            dir: PathBuf::from("./media"),
            cdn_url: None,
        })
    }

    fn ctx(media: &MediaStore) -> SeoContext<'_> {
        SeoContext {
            base_url: BASE,
            media,
            currency: CurrencyCode::EUR,
        }
    }

    #[test]
    fn test_catalog_category_canonical_and_alternates() {
        let media = media();
        let meta = metadata(
            &ctx(&media),
            Locale::En,
            SeoPage::Catalog {
                category: Some("foil balloons"),
            },
        );

        assert_eq!(
            meta.canonical,
            "https://ballonwerk.example/en/products?category=foil%20balloons"
        );
        assert_eq!(meta.title, "foil balloons | Ballonwerk");
        let langs: Vec<&str> = meta.alternates.iter().map(|a| a.hreflang).collect();
        assert_eq!(langs, vec!["de", "en", "ru", "uk", "x-default"]);
        assert_eq!(
            meta.alternates.last().unwrap().href,
            "https://ballonwerk.example/de/products?category=foil%20balloons"
        );
        assert_eq!(meta.robots, "index, follow");
        assert_eq!(meta.json_ld[0]["@type"], "BreadcrumbList");
    }

    #[test]
    fn test_product_metadata() {
        let media = media();
        let mut p = product(12, "8.90", Some(2));
        p.description = "Gold heart. ".repeat(30);
        let meta = metadata(&ctx(&media), Locale::Uk, SeoPage::Product(&p));

        assert_eq!(meta.canonical, "https://ballonwerk.example/uk/products/12");
        assert_eq!(meta.open_graph.og_type, "product");
        assert_eq!(meta.open_graph.locale, "uk_UA");
        assert_eq!(meta.open_graph.alternate_locales.len(), 3);
        assert_eq!(
            meta.open_graph.image,
            "https://ballonwerk.example/media/products/12.webp"
        );
        assert_eq!(meta.description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(meta.description.ends_with('…'));
        assert_eq!(meta.json_ld[0]["@type"], "Product");
        assert_eq!(meta.json_ld[1]["itemListElement"][3]["name"], "Balloon 12");
        assert_eq!(meta.twitter.card, "summary_large_image");
    }

    #[test]
    fn test_private_pages_are_not_indexed() {
        let media = media();
        for page in [SeoPage::Cart, SeoPage::Checkout, SeoPage::Profile] {
            let meta = metadata(&ctx(&media), Locale::De, page);
            assert_eq!(meta.robots, "noindex, nofollow");
            assert!(meta.json_ld.is_empty());
        }
    }

    #[test]
    fn test_home_metadata() {
        let media = media();
        let meta = metadata(&ctx(&media), Locale::Ru, SeoPage::Home);
        assert_eq!(meta.canonical, "https://ballonwerk.example/ru");
        assert_eq!(meta.title, Message::HomeTitle.text(Locale::Ru));
        assert_eq!(meta.open_graph.og_type, "website");
        assert_eq!(
            meta.open_graph.image,
            "https://ballonwerk.example/static/images/og-default.jpg"
        );
        assert_eq!(meta.json_ld[0]["@type"], "Store");
    }

    #[test]
    fn test_short_description_is_kept() {
        assert_eq!(truncate_description("  Red   heart\nballoon "), "Red heart balloon");
    }

    #[test]
    fn test_json_ld_script_escapes_tags() {
        let media = media();
        let mut p = product(1, "1.00", None);
        p.name = "</script><b>".to_string();
        let meta = metadata(&ctx(&media), Locale::En, SeoPage::Product(&p));
        assert!(meta.json_ld_scripts().iter().all(|s| !s.contains("</script")));
    }
}
