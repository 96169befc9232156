use async_trait::async_trait;
use cashier_shared::pii::Masked;

use crate::money::Currency;

/// A single charge attempt against a card token.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in minor currency units (e.g. cents)
    pub amount: i64,
    pub currency: Currency,
    pub card_token: Masked<String>,
    pub description: String,
    pub receipt_email: Masked<String>,
    /// Sent with the charge so a replayed submission is not charged twice
    pub idempotency_key: Masked<String>,
}

impl ChargeRequest {
    pub fn new(
        order_id: &str,
        amount: i64,
        currency: Currency,
        card_token: String,
        description: String,
        receipt_email: String,
    ) -> Self {
        // Tokens are single-use, so order + token identifies one submission.
        let idempotency_key = format!("cashier-{}-{}", order_id, card_token);
        Self {
            amount,
            currency,
            card_token: Masked::new(card_token),
            description,
            receipt_email: Masked::new(receipt_email),
            idempotency_key: Masked::new(idempotency_key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Charge captured; carries the processor's charge id
    Success { charge_id: String },
    /// Card rejected by the issuer or processor (decline, insufficient funds, ...)
    Declined { message: String },
    /// Network failure, timeout, rate limiting or processor-side error
    TransientFailure { message: String },
}

impl ChargeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ChargeOutcome::Success { .. } => "SUCCEEDED",
            ChargeOutcome::Declined { .. } => "DECLINED",
            ChargeOutcome::TransientFailure { .. } => "TRANSIENT_FAILURE",
        }
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create and capture a charge. Every failure mode is reported through
    /// the returned outcome.
    async fn create_charge(&self, request: &ChargeRequest) -> ChargeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_request_masks_token_in_debug() {
        let request = ChargeRequest::new(
            "order-1",
            1500,
            Currency::default(),
            "tok_secret".to_string(),
            "a@b.c: Apple: 1 Main St".to_string(),
            "a@b.c".to_string(),
        );

        let debug = format!("{:?}", request);
        assert!(!debug.contains("tok_secret"));
        assert_eq!(request.idempotency_key.expose(), "cashier-order-1-tok_secret");
    }

    #[test]
    fn test_outcome_labels() {
        let ok = ChargeOutcome::Success { charge_id: "ch_1".into() };
        let declined = ChargeOutcome::Declined { message: "Your card was declined.".into() };
        assert_eq!(ok.label(), "SUCCEEDED");
        assert_eq!(declined.label(), "DECLINED");
    }
}
