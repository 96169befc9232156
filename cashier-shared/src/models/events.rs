use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentConfirmedEvent {
    pub event_id: Uuid,
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub transaction_id: String,
    pub backend: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentCancelledEvent {
    pub event_id: Uuid,
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub backend: String,
    pub reason: String,
    pub timestamp: i64,
}

impl PaymentConfirmedEvent {
    pub fn new(order_id: &str, amount_minor: i64, currency: &str, transaction_id: &str, backend: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            amount_minor,
            currency: currency.to_string(),
            transaction_id: transaction_id.to_string(),
            backend: backend.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl PaymentCancelledEvent {
    pub fn new(order_id: &str, amount_minor: i64, currency: &str, backend: &str, reason: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            amount_minor,
            currency: currency.to_string(),
            backend: backend.to_string(),
            reason: reason.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Emit an audit record as a single JSON line on the `cashier::audit` target.
pub fn publish_audit<E: Serialize>(kind: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => tracing::info!(target: "cashier::audit", kind, %payload),
        Err(e) => tracing::error!(target: "cashier::audit", kind, "Failed to serialize audit event: {}", e),
    }
}
