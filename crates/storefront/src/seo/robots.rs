//! `robots.txt`.

use std::fmt::Write;

use ballonwerk_core::Locale;

/// Private per-locale pages kept out of the index.
const PRIVATE_PAGES: &[&str] = &["cart", "checkout", "profile"];

/// Render `robots.txt` for the site at `base_url`.
#[must_use]
pub fn robots_txt(base_url: &str) -> String {
    let mut out = String::from("User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api\n");
    for locale in Locale::ALL {
        for page in PRIVATE_PAGES {
            let _ = writeln!(out, "Disallow: /{}/{page}", locale.code());
        }
    }
    let _ = write!(out, "\nSitemap: {base_url}/sitemap.xml\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_txt() {
        let robots = robots_txt("https://ballonwerk.example");
        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        assert!(robots.contains("Disallow: /admin\n"));
        assert!(robots.contains("Disallow: /api\n"));
        assert!(robots.contains("Disallow: /uk/checkout\n"));
        assert!(robots.contains("Disallow: /de/profile\n"));
        assert_eq!(robots.matches("Disallow: /").count(), 2 + 4 * 3);
        assert!(robots.ends_with("Sitemap: https://ballonwerk.example/sitemap.xml\n"));
    }
}
