//! Supported shop locales.
//!
//! The locale is carried in the first URL path segment (`/de/...`, `/en/...`).

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned for an unsupported locale tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct LocaleError(String);

/// A shop locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
    Ru,
    Uk,
}

impl Locale {
    /// All locales, default first.
    pub const ALL: [Self; 4] = [Self::De, Self::En, Self::Ru, Self::Uk];

    /// Path prefix / hreflang code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Ru => "ru",
            Self::Uk => "uk",
        }
    }

    /// Open Graph locale tag.
    #[must_use]
    pub const fn og_locale(self) -> &'static str {
        match self {
            Self::De => "de_DE",
            Self::En => "en_US",
            Self::Ru => "ru_RU",
            Self::Uk => "uk_UA",
        }
    }

    /// Locale named by the first segment of a request path, if any.
    ///
    /// ```
    /// use ballonwerk_core::Locale;
    ///
    /// assert_eq!(Locale::from_path("/en/products/3"), Some(Locale::En));
    /// assert_eq!(Locale::from_path("/products"), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let first = path.trim_start_matches('/').split('/').next()?;
        first.parse().ok()
    }

    /// Best supported match for an `Accept-Language` header value.
    ///
    /// Tags are taken in header order; quality weights are ignored. `ua` is
    /// accepted as a common misspelling of `uk`.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header.split(',').find_map(|part| {
            let tag = part.split(';').next()?.trim();
            let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
            match primary.as_str() {
                "ua" => Some(Self::Uk),
                other => other.parse().ok(),
            }
        })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| LocaleError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Locale::from_path("/ru"), Some(Locale::Ru));
        assert_eq!(Locale::from_path("uk/cart"), Some(Locale::Uk));
        assert_eq!(Locale::from_path("/"), None);
        assert_eq!(Locale::from_path("/fr/products"), None);
    }

    #[test]
    fn test_from_accept_language() {
        assert_eq!(
            Locale::from_accept_language("fr-FR,en-US;q=0.8,de;q=0.5"),
            Some(Locale::En)
        );
        assert_eq!(Locale::from_accept_language("ua"), Some(Locale::Uk));
        assert_eq!(Locale::from_accept_language("fr, it"), None);
    }

    #[test]
    fn test_default_is_german() {
        assert_eq!(Locale::default(), Locale::De);
        assert_eq!(Locale::ALL.first(), Some(&Locale::De));
    }
}
