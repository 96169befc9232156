use async_trait::async_trait;
use cashier_core::{Order, Shop, ShopContext, ShopError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Confirmed,
    Cancelled,
}

/// One confirm/cancel transition requested by a payment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    /// Minor units
    pub amount: i64,
    pub transaction_id: Option<String>,
    pub backend: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
struct FixtureOrder {
    #[serde(flatten)]
    order: Order,
    customer_id: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    orders: Vec<FixtureOrder>,
}

/// A thread-safe in-memory shop.
///
/// Carts point a customer or a session at an open order. Confirming a payment
/// closes the cart; cancelled attempts leave it open so the buyer can retry.
#[derive(Clone)]
pub struct InMemoryShop {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    carts: Arc<RwLock<HashMap<String, String>>>,
    payments: Arc<RwLock<Vec<PaymentRecord>>>,
    finished_url: String,
    cancel_url: String,
}

fn customer_key(customer_id: &str) -> String {
    format!("customer:{}", customer_id)
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

impl InMemoryShop {
    pub fn new(finished_url: &str, cancel_url: &str) -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            carts: Arc::new(RwLock::new(HashMap::new())),
            payments: Arc::new(RwLock::new(Vec::new())),
            finished_url: finished_url.to_string(),
            cancel_url: cancel_url.to_string(),
        }
    }

    pub async fn insert_order(&self, order: Order) {
        let mut orders = self.orders.write().await;
        orders.insert(order.unique_id.clone(), order);
    }

    pub async fn bind_customer(&self, customer_id: &str, order_id: &str) {
        let mut carts = self.carts.write().await;
        carts.insert(customer_key(customer_id), order_id.to_string());
    }

    pub async fn bind_session(&self, session_id: &str, order_id: &str) {
        let mut carts = self.carts.write().await;
        carts.insert(session_key(session_id), order_id.to_string());
    }

    pub async fn payments(&self) -> Vec<PaymentRecord> {
        self.payments.read().await.clone()
    }

    /// Seed orders and carts from a JSON file of the form
    /// `{"orders": [{"unique_id": ..., "items": [...], "total": "9.99",
    /// "customer_id": ..., "session_id": ...}]}`.
    pub async fn load_fixture(&self, path: impl AsRef<Path>) -> Result<usize, ShopError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ShopError::Unavailable(format!("Cannot read {}: {}", path.display(), e)))?;
        let fixture: Fixture = serde_json::from_str(&raw)
            .map_err(|e| ShopError::Unavailable(format!("Invalid fixture {}: {}", path.display(), e)))?;

        let count = fixture.orders.len();
        for entry in fixture.orders {
            let order_id = entry.order.unique_id.clone();
            self.insert_order(entry.order).await;
            if let Some(customer_id) = entry.customer_id {
                self.bind_customer(&customer_id, &order_id).await;
            }
            if let Some(session_id) = entry.session_id {
                self.bind_session(&session_id, &order_id).await;
            }
        }

        tracing::info!("Loaded {} orders from {}", count, path.display());
        Ok(count)
    }

    async fn record(&self, record: PaymentRecord) {
        let mut payments = self.payments.write().await;
        payments.push(record);
    }
}

#[async_trait]
impl Shop for InMemoryShop {
    async fn get_order(&self, context: &ShopContext) -> Result<Option<Order>, ShopError> {
        let keys = context
            .customer_id
            .as_deref()
            .map(customer_key)
            .into_iter()
            .chain(context.session_id.as_deref().map(session_key));

        let carts = self.carts.read().await;
        let orders = self.orders.read().await;
        for key in keys {
            if let Some(order) = carts.get(&key).and_then(|order_id| orders.get(order_id)) {
                return Ok(Some(order.clone()));
            }
        }
        Ok(None)
    }

    async fn get_order_for_id(&self, order_id: &str) -> Result<Order, ShopError> {
        let orders = self.orders.read().await;
        orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| ShopError::NotFound(order_id.to_string()))
    }

    async fn confirm_payment(
        &self,
        order: &Order,
        amount: i64,
        transaction_id: &str,
        backend_name: &str,
    ) -> Result<(), ShopError> {
        // Check and record under one guard so concurrent confirms cannot both pass
        let mut payments = self.payments.write().await;
        let already_paid = payments
            .iter()
            .any(|p| p.order_id == order.unique_id && p.status == PaymentStatus::Confirmed);
        if already_paid {
            return Err(ShopError::InvalidTransition {
                order_id: order.unique_id.clone(),
                reason: "order is already paid".to_string(),
            });
        }

        payments.push(PaymentRecord {
            order_id: order.unique_id.clone(),
            amount,
            transaction_id: Some(transaction_id.to_string()),
            backend: backend_name.to_string(),
            status: PaymentStatus::Confirmed,
        });
        drop(payments);

        // Paid orders leave the cart
        let mut carts = self.carts.write().await;
        carts.retain(|_, order_id| order_id != &order.unique_id);
        Ok(())
    }

    async fn cancel_payment(&self, order: &Order, amount: i64, backend_name: &str) -> Result<(), ShopError> {
        self.record(PaymentRecord {
            order_id: order.unique_id.clone(),
            amount,
            transaction_id: None,
            backend: backend_name.to_string(),
            status: PaymentStatus::Cancelled,
        })
        .await;
        Ok(())
    }

    fn get_finished_url(&self) -> String {
        self.finished_url.clone()
    }

    fn get_cancel_url(&self) -> String {
        self.cancel_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashier_core::OrderLine;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn order(id: &str) -> Order {
        Order {
            unique_id: id.to_string(),
            items: vec![OrderLine { product_name: "Widget".to_string() }],
            total: dec!(12.50),
            shipping_address_text: Some("1 Main St".to_string()),
        }
    }

    #[tokio::test]
    async fn test_customer_cart_wins_over_session() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        shop.insert_order(order("a")).await;
        shop.insert_order(order("b")).await;
        shop.bind_customer("cust-1", "a").await;
        shop.bind_session("sess-1", "b").await;

        let both = ShopContext { customer_id: Some("cust-1".into()), session_id: Some("sess-1".into()) };
        assert_eq!(shop.get_order(&both).await.unwrap().unwrap().unique_id, "a");

        let session_only = ShopContext { customer_id: None, session_id: Some("sess-1".into()) };
        assert_eq!(shop.get_order(&session_only).await.unwrap().unwrap().unique_id, "b");

        assert!(shop.get_order(&ShopContext::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_closes_cart_and_rejects_double_payment() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        shop.insert_order(order("a")).await;
        shop.bind_session("sess-1", "a").await;
        let ctx = ShopContext { customer_id: None, session_id: Some("sess-1".into()) };

        let paid = shop.get_order_for_id("a").await.unwrap();
        shop.confirm_payment(&paid, 1250, "ch_1", "Stripe").await.unwrap();

        assert!(shop.get_order(&ctx).await.unwrap().is_none());
        assert!(matches!(
            shop.confirm_payment(&paid, 1250, "ch_2", "Stripe").await,
            Err(ShopError::InvalidTransition { .. })
        ));
        assert_eq!(
            shop.payments().await,
            vec![PaymentRecord {
                order_id: "a".into(),
                amount: 1250,
                transaction_id: Some("ch_1".into()),
                backend: "Stripe".into(),
                status: PaymentStatus::Confirmed,
            }]
        );
    }

    #[tokio::test]
    async fn test_concurrent_confirms_record_one_payment() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        shop.insert_order(order("a")).await;
        let paid = shop.get_order_for_id("a").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shop = shop.clone();
                let paid = paid.clone();
                tokio::spawn(async move { shop.confirm_payment(&paid, 1250, &format!("ch_{i}"), "Stripe").await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        let confirmed = shop
            .payments()
            .await
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Confirmed)
            .count();
        assert_eq!(confirmed, 1);
    }

    #[tokio::test]
    async fn test_cancel_keeps_cart_open() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        shop.insert_order(order("a")).await;
        shop.bind_customer("cust-1", "a").await;

        shop.cancel_payment(&order("a"), 1250, "Stripe").await.unwrap();

        let ctx = ShopContext { customer_id: Some("cust-1".into()), session_id: None };
        assert!(shop.get_order(&ctx).await.unwrap().is_some());
        assert_eq!(shop.payments().await[0].status, PaymentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_order_id() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        assert!(matches!(shop.get_order_for_id("missing").await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"orders": [
                {{"unique_id": "order-1", "items": [{{"product_name": "Apple"}}], "total": "9.99",
                  "shipping_address_text": "2 Side St", "session_id": "sess-9"}},
                {{"unique_id": "order-2", "items": [], "total": "1.00", "customer_id": "cust-2"}}
            ]}}"#
        )
        .unwrap();

        let shop = InMemoryShop::new("/done/", "/cart/");
        assert_eq!(shop.load_fixture(file.path()).await.unwrap(), 2);

        let ctx = ShopContext { customer_id: None, session_id: Some("sess-9".into()) };
        let order = shop.get_order(&ctx).await.unwrap().unwrap();
        assert_eq!(order.unique_id, "order-1");
        assert_eq!(order.total, dec!(9.99));

        let customer = ShopContext { customer_id: Some("cust-2".into()), session_id: None };
        assert_eq!(shop.get_order(&customer).await.unwrap().unwrap().shipping_address_text, None);
    }

    #[tokio::test]
    async fn test_missing_fixture_file() {
        let shop = InMemoryShop::new("/done/", "/cart/");
        assert!(matches!(
            shop.load_fixture("/nonexistent/orders.json").await,
            Err(ShopError::Unavailable(_))
        ));
    }
}
