//! Orders and the checkout form.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ballonwerk_core::{
    CurrencyCode, DeliveryType, Email, Locale, OrderId, OrderStatus, PaymentMethod, ProductId,
    UserId,
};

use super::cart::Personalization;
use super::validation::ValidationErrors;
use crate::i18n::Message;

/// Digits, spaces and `+ - ( )`, 6 to 20 characters.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9 +()\-]{6,20}$").expect("Invalid regex"));

/// German and Austrian style postal codes.
static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,5}$").expect("Invalid regex"));

/// Whether `phone` is an acceptable contact number.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim()) && phone.chars().any(|c| c.is_ascii_digit())
}

/// Whether `code` is a 4 or 5 digit postal code.
#[must_use]
pub fn is_valid_postal_code(code: &str) -> bool {
    POSTAL_CODE_RE.is_match(code.trim())
}

/// Immutable snapshot of a purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price at the time of purchase.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization: Option<Personalization>,
}

impl OrderItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    pub whatsapp_confirmed: bool,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checkout form as submitted by the client after the last step.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub whatsapp_confirmed: bool,
}

/// A checkout form that passed validation.
///
/// Serialized into the payment row so a card order can be created later from
/// the webhook, without the shopper's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub delivery_type: DeliveryType,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub whatsapp_confirmed: bool,
}

impl CheckoutForm {
    /// Validate the whole form, reporting every failing field in `locale`.
    ///
    /// Address fields are only required for delivery and are dropped for pickup.
    ///
    /// # Errors
    ///
    /// Returns the collected field errors.
    pub fn validate(self, locale: Locale) -> Result<CheckoutDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_owned();
        if !(2..=100).contains(&name.chars().count()) {
            errors.add("name", Message::NameLength.text(locale));
        }

        let email = Email::parse(&self.email);
        if email.is_err() {
            errors.add("email", Message::EmailInvalid.text(locale));
        }

        let phone = self.phone.trim().to_owned();
        if !is_valid_phone(&phone) {
            errors.add("phone", Message::PhoneInvalid.text(locale));
        }

        let trimmed = |v: Option<String>| {
            v.map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
        };
        let (street, city, postal_code) = match self.delivery_type {
            DeliveryType::Pickup => (None, None, None),
            DeliveryType::Delivery => {
                let street = trimmed(self.street);
                let city = trimmed(self.city);
                let postal_code = trimmed(self.postal_code);
                if street.is_none() {
                    errors.add("street", Message::AddressRequired.text(locale));
                }
                if city.is_none() {
                    errors.add("city", Message::AddressRequired.text(locale));
                }
                match &postal_code {
                    None => errors.add("postal_code", Message::AddressRequired.text(locale)),
                    Some(code) if !is_valid_postal_code(code) => {
                        errors.add("postal_code", Message::PostalCodeInvalid.text(locale));
                    }
                    Some(_) => {}
                }
                (street, city, postal_code)
            }
        };

        let notes = trimmed(self.notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > 500) {
            errors.add("notes", Message::NotesTooLong.text(locale));
        }

        match email {
            Ok(email) if errors.is_empty() => Ok(CheckoutDetails {
                name,
                email,
                phone,
                delivery_type: self.delivery_type,
                street,
                city,
                postal_code,
                notes,
                whatsapp_confirmed: self.whatsapp_confirmed,
            }),
            _ => Err(errors),
        }
    }
}

/// Orders list filter for the admin dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Admin request to move an order forward.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Anna Schmidt".to_string(),
            email: "Anna@Example.de".to_string(),
            phone: "+49 (151) 234-5678".to_string(),
            delivery_type: DeliveryType::Pickup,
            street: Some("Ignored 1".to_string()),
            city: None,
            postal_code: None,
            notes: None,
            whatsapp_confirmed: true,
        }
    }

    #[test]
    fn test_pickup_form_is_valid_and_drops_address() {
        let details = form().validate(Locale::De).unwrap();
        assert_eq!(details.email.as_str(), "anna@example.de");
        assert_eq!(details.street, None);
        assert!(details.whatsapp_confirmed);
    }

    #[test]
    fn test_delivery_requires_address() {
        let mut f = form();
        f.delivery_type = DeliveryType::Delivery;
        f.street = None;
        f.postal_code = Some("12a45".to_string());
        let errors = f.validate(Locale::En).unwrap_err();
        assert_eq!(errors.get("street"), Some(Message::AddressRequired.text(Locale::En)));
        assert_eq!(errors.get("city"), Some(Message::AddressRequired.text(Locale::En)));
        assert_eq!(
            errors.get("postal_code"),
            Some(Message::PostalCodeInvalid.text(Locale::En))
        );
    }

    #[test]
    fn test_reports_all_contact_errors_at_once() {
        let f = CheckoutForm {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            phone: "call me".to_string(),
            notes: Some("x".repeat(501)),
            ..form()
        };
        let errors = f.validate(Locale::Ru).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("name"), Some(Message::NameLength.text(Locale::Ru)));
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("notes").is_some());
    }

    #[test]
    fn test_phone_and_postal_code_rules() {
        assert!(is_valid_phone("0151 2345678"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+49 151 2345 6789 0000"));
        assert!(!is_valid_phone("------"));
        assert!(is_valid_postal_code("1010"));
        assert!(is_valid_postal_code("10115"));
        assert!(!is_valid_postal_code("101150"));
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            name: "Heart".to_string(),
            quantity: 3,
            price: "2.50".parse().unwrap(),
            personalization: None,
        };
        assert_eq!(item.line_total(), "7.50".parse::<Decimal>().unwrap());
    }
}
