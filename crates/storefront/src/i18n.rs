//! Localised user-facing strings.
//!
//! The catalogue is small and static, so it lives in code rather than in
//! message files. Every [`Message`] has a translation for every [`Locale`].

use ballonwerk_core::Locale;

/// A user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    // Cart
    OutOfStock,
    InvalidQuantity,
    ProductNotFound,
    PersonalizationNotAllowed,
    CartEmpty,

    // Checkout validation
    NameLength,
    EmailInvalid,
    PhoneInvalid,
    AddressRequired,
    PostalCodeInvalid,
    NotesTooLong,
    WhatsappConfirmationRequired,

    // Payments
    CardDeclined,
    InsufficientFunds,
    ExpiredCard,
    IncorrectCvc,
    CardLostOrStolen,
    AuthenticationRequired,
    ProcessingError,
    PaymentFailed,
    PaymentCanceled,

    // Generic
    InternalError,

    // SEO copy
    SiteTagline,
    SiteDescription,
    HomeTitle,
    CatalogTitle,
    CatalogDescription,
    CartTitle,
    CheckoutTitle,
    ProfileTitle,

    // Page chrome
    SoldOut,
    NoProducts,
}

impl Message {
    /// Translation of this message in `locale`.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub const fn text(self, locale: Locale) -> &'static str {
        use Locale::{De, En, Ru, Uk};

        match (self, locale) {
            (Self::OutOfStock, De) => "Dieser Artikel ist leider ausverkauft.",
            (Self::OutOfStock, En) => "This item is out of stock.",
            (Self::OutOfStock, Ru) => "Этого товара нет в наличии.",
            (Self::OutOfStock, Uk) => "Цього товару немає в наявності.",

            (Self::InvalidQuantity, De) => "Bitte gib eine gültige Menge ein.",
            (Self::InvalidQuantity, En) => "Please enter a valid quantity.",
            (Self::InvalidQuantity, Ru) => "Укажите корректное количество.",
            (Self::InvalidQuantity, Uk) => "Вкажіть коректну кількість.",

            (Self::ProductNotFound, De) => "Produkt nicht gefunden.",
            (Self::ProductNotFound, En) => "Product not found.",
            (Self::ProductNotFound, Ru) => "Товар не найден.",
            (Self::ProductNotFound, Uk) => "Товар не знайдено.",

            (Self::PersonalizationNotAllowed, De) => {
                "Diese Personalisierung ist für das Produkt nicht verfügbar."
            }
            (Self::PersonalizationNotAllowed, En) => {
                "This personalization is not available for the product."
            }
            (Self::PersonalizationNotAllowed, Ru) => "Такая персонализация недоступна для товара.",
            (Self::PersonalizationNotAllowed, Uk) => "Така персоналізація недоступна для товару.",

            (Self::CartEmpty, De) => "Dein Warenkorb ist leer.",
            (Self::CartEmpty, En) => "Your cart is empty.",
            (Self::CartEmpty, Ru) => "Ваша корзина пуста.",
            (Self::CartEmpty, Uk) => "Ваш кошик порожній.",

            (Self::NameLength, De) => "Der Name muss 2 bis 100 Zeichen lang sein.",
            (Self::NameLength, En) => "Name must be 2 to 100 characters long.",
            (Self::NameLength, Ru) => "Имя должно содержать от 2 до 100 символов.",
            (Self::NameLength, Uk) => "Ім'я має містити від 2 до 100 символів.",

            (Self::EmailInvalid, De) => "Bitte gib eine gültige E-Mail-Adresse ein.",
            (Self::EmailInvalid, En) => "Please enter a valid email address.",
            (Self::EmailInvalid, Ru) => "Введите корректный адрес электронной почты.",
            (Self::EmailInvalid, Uk) => "Введіть коректну адресу електронної пошти.",

            (Self::PhoneInvalid, De) => "Bitte gib eine gültige Telefonnummer ein.",
            (Self::PhoneInvalid, En) => "Please enter a valid phone number.",
            (Self::PhoneInvalid, Ru) => "Введите корректный номер телефона.",
            (Self::PhoneInvalid, Uk) => "Введіть коректний номер телефону.",

            (Self::AddressRequired, De) => "Für die Lieferung wird eine Adresse benötigt.",
            (Self::AddressRequired, En) => "An address is required for delivery.",
            (Self::AddressRequired, Ru) => "Для доставки нужен адрес.",
            (Self::AddressRequired, Uk) => "Для доставки потрібна адреса.",

            (Self::PostalCodeInvalid, De) => "Die Postleitzahl muss 4 oder 5 Ziffern haben.",
            (Self::PostalCodeInvalid, En) => "Postal code must have 4 or 5 digits.",
            (Self::PostalCodeInvalid, Ru) => "Почтовый индекс должен содержать 4 или 5 цифр.",
            (Self::PostalCodeInvalid, Uk) => "Поштовий індекс має містити 4 або 5 цифр.",

            (Self::NotesTooLong, De) => "Die Anmerkung darf höchstens 500 Zeichen lang sein.",
            (Self::NotesTooLong, En) => "Notes can be at most 500 characters long.",
            (Self::NotesTooLong, Ru) => "Комментарий не может быть длиннее 500 символов.",
            (Self::NotesTooLong, Uk) => "Коментар не може бути довшим за 500 символів.",

            (Self::WhatsappConfirmationRequired, De) => {
                "Bitte bestätige, dass wir dich per WhatsApp kontaktieren dürfen."
            }
            (Self::WhatsappConfirmationRequired, En) => {
                "Please confirm that we may contact you via WhatsApp."
            }
            (Self::WhatsappConfirmationRequired, Ru) => {
                "Подтвердите, что мы можем связаться с вами в WhatsApp."
            }
            (Self::WhatsappConfirmationRequired, Uk) => {
                "Підтвердіть, що ми можемо зв'язатися з вами у WhatsApp."
            }

            (Self::CardDeclined, De) => "Deine Karte wurde abgelehnt.",
            (Self::CardDeclined, En) => "Your card was declined.",
            (Self::CardDeclined, Ru) => "Ваша карта была отклонена.",
            (Self::CardDeclined, Uk) => "Вашу картку було відхилено.",

            (Self::InsufficientFunds, De) => "Deine Karte ist nicht ausreichend gedeckt.",
            (Self::InsufficientFunds, En) => "Your card has insufficient funds.",
            (Self::InsufficientFunds, Ru) => "На карте недостаточно средств.",
            (Self::InsufficientFunds, Uk) => "На картці недостатньо коштів.",

            (Self::ExpiredCard, De) => "Deine Karte ist abgelaufen.",
            (Self::ExpiredCard, En) => "Your card has expired.",
            (Self::ExpiredCard, Ru) => "Срок действия карты истёк.",
            (Self::ExpiredCard, Uk) => "Термін дії картки минув.",

            (Self::IncorrectCvc, De) => "Der Sicherheitscode ist falsch.",
            (Self::IncorrectCvc, En) => "The security code is incorrect.",
            (Self::IncorrectCvc, Ru) => "Неверный код безопасности.",
            (Self::IncorrectCvc, Uk) => "Невірний код безпеки.",

            (Self::CardLostOrStolen, De) => {
                "Diese Karte kann nicht verwendet werden. Bitte nutze eine andere Karte."
            }
            (Self::CardLostOrStolen, En) => "This card cannot be used. Please use another card.",
            (Self::CardLostOrStolen, Ru) => {
                "Эту карту нельзя использовать. Пожалуйста, используйте другую."
            }
            (Self::CardLostOrStolen, Uk) => {
                "Цю картку не можна використати. Будь ласка, скористайтеся іншою."
            }

            (Self::AuthenticationRequired, De) => "Deine Bank verlangt eine zusätzliche Bestätigung.",
            (Self::AuthenticationRequired, En) => "Your bank requires additional authentication.",
            (Self::AuthenticationRequired, Ru) => "Банк требует дополнительного подтверждения.",
            (Self::AuthenticationRequired, Uk) => "Банк вимагає додаткового підтвердження.",

            (Self::ProcessingError, De) => {
                "Bei der Verarbeitung deiner Karte ist ein Fehler aufgetreten."
            }
            (Self::ProcessingError, En) => "An error occurred while processing your card.",
            (Self::ProcessingError, Ru) => "При обработке карты произошла ошибка.",
            (Self::ProcessingError, Uk) => "Під час обробки картки сталася помилка.",

            (Self::PaymentFailed, De) => "Die Zahlung ist fehlgeschlagen. Bitte versuche es erneut.",
            (Self::PaymentFailed, En) => "The payment failed. Please try again.",
            (Self::PaymentFailed, Ru) => "Платёж не прошёл. Попробуйте ещё раз.",
            (Self::PaymentFailed, Uk) => "Платіж не пройшов. Спробуйте ще раз.",

            (Self::PaymentCanceled, De) => "Die Zahlung wurde abgebrochen.",
            (Self::PaymentCanceled, En) => "The payment was canceled.",
            (Self::PaymentCanceled, Ru) => "Платёж был отменён.",
            (Self::PaymentCanceled, Uk) => "Платіж було скасовано.",

            (Self::InternalError, De) => "Etwas ist schiefgelaufen. Bitte versuche es später erneut.",
            (Self::InternalError, En) => "Something went wrong. Please try again later.",
            (Self::InternalError, Ru) => "Что-то пошло не так. Попробуйте позже.",
            (Self::InternalError, Uk) => "Щось пішло не так. Спробуйте пізніше.",

            (Self::SiteTagline, De) => "Ballons & Deko für jeden Anlass",
            (Self::SiteTagline, En) => "Balloons & decorations for every occasion",
            (Self::SiteTagline, Ru) => "Шары и декор для любого праздника",
            (Self::SiteTagline, Uk) => "Кульки та декор для будь-якого свята",

            (Self::SiteDescription, De) => {
                "Personalisierte Ballons, Ballongirlanden und Partydeko - zur Abholung oder mit Lieferung."
            }
            (Self::SiteDescription, En) => {
                "Personalised balloons, balloon garlands and party decorations - for pickup or delivery."
            }
            (Self::SiteDescription, Ru) => {
                "Именные шары, гирлянды из шаров и праздничный декор - самовывоз или доставка."
            }
            (Self::SiteDescription, Uk) => {
                "Іменні кульки, гірлянди з кульок і святковий декор - самовивіз або доставка."
            }

            (Self::HomeTitle, De) => "Ballonwerk - Ballons & Deko",
            (Self::HomeTitle, En) => "Ballonwerk - Balloons & Decorations",
            (Self::HomeTitle, Ru) => "Ballonwerk - шары и декор",
            (Self::HomeTitle, Uk) => "Ballonwerk - кульки та декор",

            (Self::CatalogTitle, De) => "Katalog",
            (Self::CatalogTitle, En) => "Catalog",
            (Self::CatalogTitle, Ru) => "Каталог",
            (Self::CatalogTitle, Uk) => "Каталог",

            (Self::CatalogDescription, De) => "Entdecke unsere Ballons und Dekorationen.",
            (Self::CatalogDescription, En) => "Discover our balloons and decorations.",
            (Self::CatalogDescription, Ru) => "Откройте для себя наши шары и декор.",
            (Self::CatalogDescription, Uk) => "Відкрийте для себе наші кульки та декор.",

            (Self::CartTitle, De) => "Warenkorb",
            (Self::CartTitle, En) => "Cart",
            (Self::CartTitle, Ru) => "Корзина",
            (Self::CartTitle, Uk) => "Кошик",

            (Self::CheckoutTitle, De) => "Kasse",
            (Self::CheckoutTitle, En) => "Checkout",
            (Self::CheckoutTitle, Ru) => "Оформление заказа",
            (Self::CheckoutTitle, Uk) => "Оформлення замовлення",

            (Self::ProfileTitle, De) => "Mein Konto",
            (Self::ProfileTitle, En) => "My account",
            (Self::ProfileTitle, Ru) => "Мой профиль",
            (Self::ProfileTitle, Uk) => "Мій профіль",

            (Self::SoldOut, De) => "Ausverkauft",
            (Self::SoldOut, En) => "Sold out",
            (Self::SoldOut, Ru) => "Нет в наличии",
            (Self::SoldOut, Uk) => "Немає в наявності",

            (Self::NoProducts, De) => "Keine passenden Artikel gefunden.",
            (Self::NoProducts, En) => "No matching products found.",
            (Self::NoProducts, Ru) => "Подходящих товаров не найдено.",
            (Self::NoProducts, Uk) => "Відповідних товарів не знайдено.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_locale_has_distinct_cart_title() {
        let titles: Vec<&str> = Locale::ALL
            .iter()
            .map(|l| Message::CartTitle.text(*l))
            .collect();
        assert_eq!(titles, vec!["Warenkorb", "Cart", "Корзина", "Кошик"]);
    }

    #[test]
    fn test_payment_messages_never_empty() {
        for locale in Locale::ALL {
            for msg in [
                Message::CardDeclined,
                Message::InsufficientFunds,
                Message::PaymentFailed,
            ] {
                assert!(!msg.text(locale).is_empty());
            }
        }
    }
}
