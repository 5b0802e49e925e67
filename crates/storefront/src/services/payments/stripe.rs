//! Stripe REST API client.
//!
//! Only the payment intent endpoints are used. Requests are form-encoded and
//! authenticated with the secret key as a bearer token.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use ballonwerk_core::{CurrencyCode, PaymentStatus};

use crate::config::StripeConfig;

/// Stripe API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Errors from the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe rejected the request.
    #[error("Stripe API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

/// The last failure Stripe recorded on an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentError {
    /// The most specific failure code: `decline_code`, else `code`.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.decline_code.as_deref().or(self.code.as_deref())
    }
}

/// A Stripe payment intent (the fields the shop uses).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentStatus,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    publishable_key: String,
    base_url: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            publishable_key: config.publishable_key.clone(),
            base_url: STRIPE_API_BASE.to_string(),
        }
    }

    /// Publishable key handed to the browser.
    #[must_use]
    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    /// Create a payment intent for `amount` minor units.
    ///
    /// `metadata` pairs are attached to the intent for the Stripe dashboard.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails or Stripe rejects it.
    #[instrument(skip(self, metadata))]
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: CurrencyCode,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, StripeError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), currency.stripe_code().to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(
            metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
        );

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&form)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let intent: PaymentIntent = parse_response(response).await?;
        debug!(intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    /// Fetch the current state of a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails or Stripe rejects it.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/payment_intents/{}",
                self.base_url,
                urlencoding::encode(id)
            ))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        parse_response(response).await
    }
}

/// Decode a success body, or turn an error envelope into `StripeError::Api`.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StripeError::Response(e.to_string()))?;

    if !status.is_success() {
        let err = api_error(status.as_u16(), &body);
        error!(error = %err, "Stripe API error");
        return Err(err);
    }

    serde_json::from_str(&body).map_err(|e| StripeError::Response(e.to_string()))
}

fn api_error(status: u16, body: &str) -> StripeError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => StripeError::Api {
            status,
            code: envelope.error.code,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| "Unknown error".to_string()),
        },
        Err(_) => StripeError::Api {
            status,
            code: None,
            message: "Unparseable error response".to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_deserializes() {
        let json = r#"{
            "id": "pi_123",
            "object": "payment_intent",
            "status": "requires_payment_method",
            "amount": 2450,
            "currency": "eur",
            "client_secret": "pi_123_secret_abc",
            "last_payment_error": {
                "type": "card_error",
                "code": "card_declined",
                "decline_code": "insufficient_funds",
                "message": "Your card has insufficient funds."
            }
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.status, PaymentStatus::RequiresPaymentMethod);
        assert_eq!(intent.amount, 2450);
        let error = intent.last_payment_error.unwrap();
        assert_eq!(error.reason(), Some("insufficient_funds"));
    }

    #[test]
    fn test_api_error_parsing() {
        let err = api_error(
            400,
            r#"{"error": {"type": "invalid_request_error", "code": "amount_too_small", "message": "Amount must be at least 50 cents"}}"#,
        );
        match err {
            StripeError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("amount_too_small"));
                assert!(message.contains("50 cents"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            api_error(502, "<html>bad gateway</html>"),
            StripeError::Api { status: 502, code: None, .. }
        ));
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let client = StripeClient::new(&StripeConfig {
            secret_key: SecretString::from("sk_test_very_hidden"),
            publishable_key: "pk_test_visible".to_string(),
            webhook_secret: SecretString::from("whsec_hidden"),
        });
        let debug = format!("{client:?}");
        assert!(debug.contains("pk_test_visible"));
        assert!(!debug.contains("very_hidden"));
    }
}
