//! Sanitised payment failure messages.
//!
//! Provider codes are mapped to catalogue messages; raw provider text is
//! never shown to shoppers.

use ballonwerk_core::PaymentStatus;

use crate::i18n::Message;

/// Message for a card failure code (`decline_code` or `code`).
///
/// ```
/// use ballonwerk_storefront::i18n::Message;
/// use ballonwerk_storefront::services::payments::decline::decline_message;
///
/// assert_eq!(decline_message(Some("stolen_card")), Message::CardLostOrStolen);
/// assert_eq!(decline_message(Some("do_not_honor")), Message::CardDeclined);
/// ```
#[must_use]
pub fn decline_message(code: Option<&str>) -> Message {
    let Some(code) = code else {
        return Message::PaymentFailed;
    };
    match code {
        "insufficient_funds" => Message::InsufficientFunds,
        "expired_card" => Message::ExpiredCard,
        "incorrect_cvc" | "invalid_cvc" => Message::IncorrectCvc,
        "lost_card" | "stolen_card" | "pickup_card" => Message::CardLostOrStolen,
        "authentication_required" | "payment_intent_authentication_failure" => {
            Message::AuthenticationRequired
        }
        "processing_error" => Message::ProcessingError,
        c if c == "card_declined" || c.ends_with("_decline") || c == "do_not_honor" => {
            Message::CardDeclined
        }
        _ => Message::PaymentFailed,
    }
}

/// Message for a status that ends the shopper's attempt, if any.
#[must_use]
pub const fn status_message(status: PaymentStatus) -> Option<Message> {
    match status {
        PaymentStatus::Canceled => Some(Message::PaymentCanceled),
        PaymentStatus::Failed => Some(Message::PaymentFailed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(decline_message(Some("card_declined")), Message::CardDeclined);
        assert_eq!(
            decline_message(Some("insufficient_funds")),
            Message::InsufficientFunds
        );
        assert_eq!(decline_message(Some("expired_card")), Message::ExpiredCard);
        assert_eq!(decline_message(Some("incorrect_cvc")), Message::IncorrectCvc);
        assert_eq!(decline_message(Some("lost_card")), Message::CardLostOrStolen);
        assert_eq!(
            decline_message(Some("authentication_required")),
            Message::AuthenticationRequired
        );
        assert_eq!(
            decline_message(Some("processing_error")),
            Message::ProcessingError
        );
    }

    #[test]
    fn test_unknown_codes_are_generic() {
        assert_eq!(decline_message(None), Message::PaymentFailed);
        assert_eq!(decline_message(Some("api_key_expired")), Message::PaymentFailed);
        assert_eq!(decline_message(Some("generic_decline")), Message::CardDeclined);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(
            status_message(PaymentStatus::Canceled),
            Some(Message::PaymentCanceled)
        );
        assert_eq!(status_message(PaymentStatus::Processing), None);
    }
}
