//! Stripe webhook signature verification and event parsing.
//!
//! See <https://docs.stripe.com/webhooks#verify-manually>: the
//! `Stripe-Signature` header carries a timestamp `t` and one or more `v1`
//! HMAC-SHA256 signatures of `"{t}.{payload}"`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::stripe::PaymentIntent;

/// Maximum age of a signed event, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Errors from webhook verification or parsing.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing or malformed Stripe-Signature header")]
    MalformedHeader,

    #[error("webhook timestamp outside tolerance")]
    Expired,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
}

/// Payment intent events the shop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Succeeded(PaymentIntent),
    PaymentFailed(PaymentIntent),
    Canceled(PaymentIntent),
    Processing(PaymentIntent),
    RequiresAction(PaymentIntent),
    /// Acknowledged and ignored.
    Other(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// Verify the signature header against the raw request body.
///
/// `now` is the current Unix time in seconds.
///
/// # Errors
///
/// Returns `WebhookError` if the header is malformed, the timestamp is
/// outside [`TOLERANCE_SECS`], or no signature matches.
pub fn verify_signature(
    secret: &SecretString,
    header: &str,
    payload: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::MalformedHeader)?;
    if now.abs_diff(ts) > TOLERANCE_SECS.unsigned_abs() {
        return Err(WebhookError::Expired);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if signatures
        .iter()
        .any(|sig| constant_time_compare(&expected, sig))
    {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

/// Parse a verified event body.
///
/// # Errors
///
/// Returns `WebhookError::InvalidPayload` if the body is not an event, or a
/// payment intent event carries no intent.
pub fn parse_event(payload: &str) -> Result<(String, WebhookEvent), WebhookError> {
    let raw: RawEvent =
        serde_json::from_str(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    let intent = || {
        serde_json::from_value::<PaymentIntent>(raw.data.object.clone())
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    };

    let event = match raw.event_type.as_str() {
        "payment_intent.succeeded" => WebhookEvent::Succeeded(intent()?),
        "payment_intent.payment_failed" => WebhookEvent::PaymentFailed(intent()?),
        "payment_intent.canceled" => WebhookEvent::Canceled(intent()?),
        "payment_intent.processing" => WebhookEvent::Processing(intent()?),
        "payment_intent.requires_action" => WebhookEvent::RequiresAction(intent()?),
        _ => WebhookEvent::Other(raw.event_type.clone()),
    };

    Ok((raw.id, event))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ballonwerk_core::PaymentStatus;

    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn secret() -> SecretString {
        SecretString::from("whsec_test_4f9a8c7e2b1d")
    }

    fn sign(ts: i64, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test_4f9a8c7e2b1d").unwrap();
        mac.update(format!("{ts}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature() {
        let payload = r#"{"id":"evt_1"}"#;
        let header = format!("t={NOW},v1={},v0=ignored", sign(NOW, payload));
        assert!(verify_signature(&secret(), &header, payload, NOW + 10).is_ok());
    }

    #[test]
    fn test_extreme_timestamps_are_expired() {
        for ts in [i64::MIN, i64::MAX] {
            let header = format!("t={ts},v1=ab");
            assert!(matches!(
                verify_signature(&secret(), &header, "{}", NOW),
                Err(WebhookError::Expired)
            ));
        }
        assert!(matches!(
            verify_signature(&secret(), "t=0,v1=ab", "{}", i64::MIN),
            Err(WebhookError::Expired)
        ));
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let payload = "{}";
        let header = format!("t={NOW},v1=deadbeef,v1={}", sign(NOW, payload));
        assert!(verify_signature(&secret(), &header, payload, NOW).is_ok());
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let header = format!("t={NOW},v1={}", sign(NOW, r#"{"amount":100}"#));
        assert!(matches!(
            verify_signature(&secret(), &header, r#"{"amount":1}"#, NOW),
            Err(WebhookError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_old_timestamp_is_rejected() {
        let header = format!("t={NOW},v1={}", sign(NOW, "{}"));
        assert!(matches!(
            verify_signature(&secret(), &header, "{}", NOW + TOLERANCE_SECS + 1),
            Err(WebhookError::Expired)
        ));
    }

    #[test]
    fn test_malformed_headers() {
        let only_timestamp = format!("t={NOW}");
        for header in ["", "t=abc,v1=00", "v1=00", only_timestamp.as_str()] {
            assert!(matches!(
                verify_signature(&secret(), header, "{}", NOW),
                Err(WebhookError::MalformedHeader)
            ));
        }
    }

    #[test]
    fn test_parse_payment_failed_event() {
        let payload = r#"{
            "id": "evt_9",
            "type": "payment_intent.payment_failed",
            "data": {"object": {
                "id": "pi_9", "status": "requires_payment_method",
                "amount": 1200, "currency": "eur",
                "last_payment_error": {"code": "card_declined", "decline_code": "expired_card"}
            }}
        }"#;
        let (id, event) = parse_event(payload).unwrap();
        assert_eq!(id, "evt_9");
        let WebhookEvent::PaymentFailed(intent) = event else {
            panic!("expected payment_failed");
        };
        assert_eq!(intent.status, PaymentStatus::RequiresPaymentMethod);
        assert_eq!(
            intent.last_payment_error.unwrap().reason(),
            Some("expired_card")
        );
    }

    #[test]
    fn test_unrelated_events_are_other() {
        let payload = r#"{"id":"evt_2","type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
        let (_, event) = parse_event(payload).unwrap();
        assert_eq!(event, WebhookEvent::Other("charge.refunded".to_string()));
    }
}
