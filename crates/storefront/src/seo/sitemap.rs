//! `sitemap.xml` with hreflang alternates.

use askama::Template;
use chrono::{DateTime, Utc};

use ballonwerk_core::{Locale, ProductId};

use super::{Alternate, alternates, localized_url};

/// One `<url>` entry.
#[derive(Debug, Clone)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<String>,
    pub alternates: Vec<Alternate>,
}

/// Sitemap document.
#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub urls: Vec<SitemapUrl>,
}

/// Every indexable URL: home and catalog, then each product, in every locale.
#[must_use]
pub fn sitemap_urls(base_url: &str, products: &[(ProductId, DateTime<Utc>)]) -> Vec<SitemapUrl> {
    let mut paths: Vec<(String, Option<String>)> =
        vec![(String::new(), None), ("/products".to_string(), None)];
    paths.extend(products.iter().map(|(id, updated_at)| {
        (
            format!("/products/{id}"),
            Some(updated_at.format("%Y-%m-%d").to_string()),
        )
    }));

    paths
        .iter()
        .flat_map(|(path, lastmod)| {
            let alternates = alternates(base_url, path);
            Locale::ALL.into_iter().map(move |locale| SitemapUrl {
                loc: localized_url(base_url, locale, path),
                lastmod: lastmod.clone(),
                alternates: alternates.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_sitemap_covers_every_locale() {
        let updated = Utc.with_ymd_and_hms(2026, 9, 30, 12, 0, 0).unwrap();
        let urls = sitemap_urls("https://b.example", &[(ProductId::new(3), updated)]);
        assert_eq!(urls.len(), 3 * 4);
        assert_eq!(urls[0].loc, "https://b.example/de");
        assert!(urls.iter().any(|u| u.loc == "https://b.example/uk/products/3"
            && u.lastmod.as_deref() == Some("2026-09-30")));
        assert_eq!(urls[0].alternates.len(), 5);
    }

    #[test]
    fn test_sitemap_renders_xml() {
        let xml = SitemapTemplate {
            urls: sitemap_urls("https://b.example", &[]),
        }
        .render()
        .unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://b.example/en/products</loc>"));
        assert!(xml.contains(r#"hreflang="x-default" href="https://b.example/de/products""#));
    }
}
