use async_trait::async_trait;
use cashier_core::{ChargeOutcome, ChargeRequest, PaymentProcessor};
use cashier_shared::pii::Masked;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::app_config::{StripeKeys, StripeSettings};

const GENERIC_DECLINE: &str = "Your card was declined.";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetails {
    code: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    decline_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

// ============================================================================
// Client
// ============================================================================

/// Stripe Charges API client.
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: Masked<String>,
}

impl StripeClient {
    pub fn new(api_base: &str, secret_key: Masked<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    pub fn from_settings(settings: &StripeSettings, keys: &StripeKeys) -> Result<Self, reqwest::Error> {
        Self::new(&settings.api_base, keys.secret_key.clone(), settings.timeout())
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.api_base)
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        let amount = request.amount.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.code()),
            ("source", request.card_token.expose().as_str()),
            ("description", request.description.as_str()),
            ("receipt_email", request.receipt_email.expose().as_str()),
        ];

        let response = self
            .http
            .post(self.charges_url())
            .bearer_auth(self.secret_key.expose())
            .header("Idempotency-Key", request.idempotency_key.expose().as_str())
            .form(&form)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() { "timed out" } else { "request failed" };
                tracing::warn!("Stripe charge {}: {}", reason, e);
                return ChargeOutcome::TransientFailure {
                    message: format!("Stripe charge {}: {}", reason, e),
                };
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => map_charge_response(status, &body),
            Err(e) => {
                tracing::warn!("Failed to read Stripe response body ({}): {}", status, e);
                ChargeOutcome::TransientFailure {
                    message: format!("Failed to read Stripe response: {}", e),
                }
            }
        }
    }
}

/// Translate a Charges API response into an outcome.
///
/// Only `card_error` is a decline. Every other error type (rate limiting,
/// API errors, invalid requests, authentication) is reported as transient so
/// the buyer is not told their card failed.
fn map_charge_response(status: StatusCode, body: &str) -> ChargeOutcome {
    if status.is_success() {
        return match serde_json::from_str::<ChargeResponse>(body) {
            Ok(charge) => ChargeOutcome::Success { charge_id: charge.id },
            Err(e) => ChargeOutcome::TransientFailure {
                message: format!("Unreadable charge response ({}): {}", status, e),
            },
        };
    }

    let details = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => response.error,
        Err(_) => {
            return ChargeOutcome::TransientFailure {
                message: format!("Stripe returned {}", status),
            }
        }
    };

    if details.error_type.as_deref() == Some("card_error") {
        tracing::debug!(
            "Card error code={:?} decline_code={:?}",
            details.code,
            details.decline_code
        );
        return ChargeOutcome::Declined {
            message: details.message.unwrap_or_else(|| GENERIC_DECLINE.to_string()),
        };
    }

    tracing::error!(
        "Stripe error {} type={:?} code={:?}: {:?}",
        status,
        details.error_type,
        details.code,
        details.message
    );
    ChargeOutcome::TransientFailure {
        message: format!(
            "{} ({}): {}",
            details.error_type.unwrap_or_else(|| "unknown_error".to_string()),
            status,
            details.message.unwrap_or_default()
        ),
    }
}
