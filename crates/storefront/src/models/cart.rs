//! Cart domain types.
//!
//! Signed-in shoppers keep their cart in `storefront.cart_item`; guests keep a
//! [`GuestCart`] in the server session until they sign in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ballonwerk_core::{CartItemId, CurrencyCode, ProductId, UserId};

use super::product::Product;

/// Upper bound for the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Shopper's personalization of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personalization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Personalization {
    /// Trim values and drop empty ones. Returns `None` if nothing remains.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
        };
        let normalized = Self {
            text: clean(self.text),
            color: clean(self.color),
        };
        if normalized.text.is_none() && normalized.color.is_none() {
            None
        } else {
            Some(normalized)
        }
    }

    /// Whether the product offers this personalization.
    #[must_use]
    pub fn is_allowed_for(&self, product: &Product) -> bool {
        let options = &product.personalization;
        let text_ok = self.text.as_ref().is_none_or(|text| {
            options.allows_text
                && text.chars().count() <= usize::from(options.max_text_length)
        });
        let color_ok = self.color.as_ref().is_none_or(|color| {
            options.allows_color_choice && product.colors.iter().any(|c| c == color)
        });
        text_ok && color_ok
    }
}

/// Clamp a requested line quantity to stock and to [`MAX_LINE_QUANTITY`].
///
/// `available` is `None` for products without a stock limit.
///
/// ```
/// use ballonwerk_storefront::models::cart::clamp_quantity;
///
/// assert_eq!(clamp_quantity(5, Some(3)), 3);
/// assert_eq!(clamp_quantity(500, None), 99);
/// ```
#[must_use]
pub fn clamp_quantity(requested: u32, available: Option<u32>) -> u32 {
    requested
        .min(available.unwrap_or(MAX_LINE_QUANTITY))
        .min(MAX_LINE_QUANTITY)
}

/// A cart line in the account cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub personalization: Option<sqlx::types::Json<Personalization>>,
}

/// One line of the session-resident guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization: Option<Personalization>,
}

/// Cart of a visitor who is not signed in.
///
/// Pure bookkeeping only; stock checks happen in the cart service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCart {
    pub lines: Vec<GuestCartLine>,
}

impl GuestCart {
    /// Current quantity of a product, `0` if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Set the quantity of a product's line, inserting it if needed.
    ///
    /// A quantity of `0` removes the line. `personalization` replaces the
    /// existing one only when `Some`.
    pub fn set(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        personalization: Option<Personalization>,
    ) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
            if personalization.is_some() {
                line.personalization = personalization;
            }
        } else {
            self.lines.push(GuestCartLine {
                product_id,
                quantity,
                personalization,
            });
        }
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// A cart line joined with current product data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub personalization: Option<Personalization>,
    /// Units still available; `None` when the product has no stock limit.
    pub available_quantity: Option<u32>,
}

/// The cart as shown to the shopper.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
    pub currency: CurrencyCode,
}

impl CartView {
    /// Build a view from `(product, quantity, personalization)` entries.
    ///
    /// `image_url` turns an object-store key into a public URL.
    #[must_use]
    pub fn build(
        entries: Vec<(Product, u32, Option<Personalization>)>,
        currency: CurrencyCode,
        image_url: impl Fn(&str) -> String,
    ) -> Self {
        let lines: Vec<CartLine> = entries
            .into_iter()
            .map(|(product, quantity, personalization)| CartLine {
                line_total: product.price * Decimal::from(quantity),
                unit_price: product.price,
                image_url: product.image_keys.first().map(|k| image_url(k)),
                available_quantity: product.available_quantity(),
                product_id: product.id,
                name: product.name,
                quantity,
                personalization,
            })
            .collect();

        Self {
            subtotal: lines.iter().map(|l| l.line_total).sum(),
            item_count: lines.iter().map(|l| l.quantity).sum(),
            lines,
            currency,
        }
    }

    /// An empty cart.
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
            currency,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::product;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(4, Some(10)), 4);
        assert_eq!(clamp_quantity(4, Some(2)), 2);
        assert_eq!(clamp_quantity(4, Some(0)), 0);
        assert_eq!(clamp_quantity(120, None), MAX_LINE_QUANTITY);
        assert_eq!(clamp_quantity(120, Some(150)), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_guest_cart_set_and_remove() {
        let mut cart = GuestCart::default();
        let id = ProductId::new(7);

        cart.set(id, 2, None);
        cart.set(ProductId::new(8), 1, None);
        assert_eq!(cart.quantity_of(id), 2);
        assert_eq!(cart.item_count(), 3);

        cart.set(id, 5, None);
        assert_eq!(cart.quantity_of(id), 5);
        assert_eq!(cart.lines.len(), 2);

        cart.set(id, 0, None);
        assert_eq!(cart.quantity_of(id), 0);
        assert!(!cart.remove(id));
        assert!(cart.remove(ProductId::new(8)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_guest_cart_keeps_personalization_unless_replaced() {
        let mut cart = GuestCart::default();
        let id = ProductId::new(1);
        let named = Personalization {
            text: Some("Mia 5".to_string()),
            color: None,
        };
        cart.set(id, 1, Some(named.clone()));
        cart.set(id, 3, None);
        assert_eq!(cart.lines[0].personalization, Some(named));
    }

    #[test]
    fn test_personalization_normalized_and_allowed() {
        let p = product(1, "12.00", Some(5));
        let empty = Personalization {
            text: Some("  ".to_string()),
            color: None,
        };
        assert!(empty.normalized().is_none());

        let ok = Personalization {
            text: Some(" Happy Birthday ".to_string()),
            color: Some("gold".to_string()),
        }
        .normalized()
        .unwrap();
        assert_eq!(ok.text.as_deref(), Some("Happy Birthday"));
        assert!(ok.is_allowed_for(&p));

        let wrong_color = Personalization {
            text: None,
            color: Some("blue".to_string()),
        };
        assert!(!wrong_color.is_allowed_for(&p));

        let too_long = Personalization {
            text: Some("x".repeat(21)),
            color: None,
        };
        assert!(!too_long.is_allowed_for(&p));
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::build(
            vec![
                (product(1, "4.50", Some(10)), 2, None),
                (product(2, "10.00", None), 1, None),
            ],
            CurrencyCode::EUR,
            |key| format!("/media/{key}"),
        );
        assert_eq!(view.subtotal, "19.00".parse::<Decimal>().unwrap());
        assert_eq!(view.item_count, 3);
        assert_eq!(
            view.lines[0].image_url.as_deref(),
            Some("/media/products/1.webp")
        );
        assert!(CartView::empty(CurrencyCode::EUR).is_empty());
    }
}
