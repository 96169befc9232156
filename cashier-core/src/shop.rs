use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item as the payment backend sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
}

/// Read-only view of a shop order. The shop owns its lifecycle; the payment
/// backend only reads it and asks for confirm/cancel transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub unique_id: String,
    pub items: Vec<OrderLine>,
    /// Total in decimal currency units
    pub total: Decimal,
    #[serde(default)]
    pub shipping_address_text: Option<String>,
}

/// Request context used to locate the buyer's current order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopContext {
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid payment transition for order {order_id}: {reason}")]
    InvalidTransition { order_id: String, reason: String },

    #[error("Shop unavailable: {0}")]
    Unavailable(String),
}

/// The operations the payment backend needs from the shop.
#[async_trait]
pub trait Shop: Send + Sync {
    /// Resolve the order being paid for in this request, if any
    async fn get_order(&self, context: &ShopContext) -> Result<Option<Order>, ShopError>;

    fn get_order_unique_id(&self, order: &Order) -> String {
        order.unique_id.clone()
    }

    fn get_order_total(&self, order: &Order) -> Decimal {
        order.total
    }

    async fn get_order_for_id(&self, order_id: &str) -> Result<Order, ShopError>;

    /// Mark the order paid. `amount` is in minor units.
    async fn confirm_payment(
        &self,
        order: &Order,
        amount: i64,
        transaction_id: &str,
        backend_name: &str,
    ) -> Result<(), ShopError>;

    /// Record a failed payment attempt. `amount` is in minor units.
    async fn cancel_payment(
        &self,
        order: &Order,
        amount: i64,
        backend_name: &str,
    ) -> Result<(), ShopError>;

    fn get_finished_url(&self) -> String;

    fn get_cancel_url(&self) -> String;
}
