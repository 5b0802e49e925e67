//! Request locale extractor.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};

use ballonwerk_core::Locale;

/// Locale of the current request.
///
/// Taken from the first path segment (`/en/products`), else the
/// `Accept-Language` header, else German.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

impl RequestLocale {
    /// Resolve the locale for a path and optional `Accept-Language` value.
    #[must_use]
    pub fn resolve(path: &str, accept_language: Option<&str>) -> Self {
        let locale = Locale::from_path(path)
            .or_else(|| accept_language.and_then(Locale::from_accept_language))
            .unwrap_or_default();
        Self(locale)
    }
}

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept_language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Ok(Self::resolve(parts.uri.path(), accept_language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prefix_wins() {
        assert_eq!(
            RequestLocale::resolve("/uk/products", Some("en-US")).0,
            Locale::Uk
        );
    }

    #[test]
    fn test_falls_back_to_header_then_german() {
        assert_eq!(
            RequestLocale::resolve("/api/cart", Some("ru-RU,ru;q=0.9")).0,
            Locale::Ru
        );
        assert_eq!(RequestLocale::resolve("/api/cart", Some("fr")).0, Locale::De);
        assert_eq!(RequestLocale::resolve("/api/cart", None).0, Locale::De);
    }
}
