use cashier_core::{
    to_minor_units, Buyer, ChargeOutcome, ChargeRequest, CoreError, Currency, PaymentProcessor, Shop,
    ShopContext, ShopError,
};
use cashier_shared::models::events::{publish_audit, PaymentCancelledEvent, PaymentConfirmedEvent};
use cashier_shared::pii::redact_email;
use std::sync::Arc;

use crate::form::CardForm;
use crate::resiliency::CircuitBreaker;
use crate::summary::{charge_description, order_summary};

pub const BACKEND_NAME: &str = "Stripe";
pub const URL_NAMESPACE: &str = "stripe";

pub const RETRY_LATER_MESSAGE: &str =
    "We could not reach the payment processor. Your card has not been charged, please try again in a few minutes.";

/// How a card submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDecision {
    /// Charged and confirmed with the shop
    Confirmed { charge_id: String, redirect_to: String },
    /// Card declined; the shop recorded the cancelled attempt
    Declined { message: String, redirect_to: String },
    /// Processor unreachable; nothing was recorded
    Unavailable { message: String },
}

/// What the payment page shows about the order being paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPreview {
    pub order_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub summary: String,
}

/// Mediates one card submission into a processor charge and a shop
/// transition.
pub struct PaymentBackend {
    shop: Arc<dyn Shop>,
    processor: Arc<dyn PaymentProcessor>,
    currency: Currency,
    breaker: CircuitBreaker,
}

impl PaymentBackend {
    pub fn new(
        shop: Arc<dyn Shop>,
        processor: Arc<dyn PaymentProcessor>,
        currency: Currency,
        breaker: CircuitBreaker,
    ) -> Self {
        Self { shop, processor, currency, breaker }
    }

    pub fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn finished_url(&self) -> String {
        self.shop.get_finished_url()
    }

    pub fn cancel_url(&self) -> String {
        self.shop.get_cancel_url()
    }

    /// Amount and summary of the order the buyer is about to pay, if the
    /// shop has one for this request.
    pub async fn checkout_preview(&self, context: &ShopContext) -> Result<Option<CheckoutPreview>, CheckoutError> {
        let order = match self.shop.get_order(context).await? {
            Some(order) => order,
            None => return Ok(None),
        };

        Ok(Some(CheckoutPreview {
            order_id: self.shop.get_order_unique_id(&order),
            amount: to_minor_units(self.shop.get_order_total(&order))?,
            currency: self.currency.clone(),
            summary: order_summary(&order),
        }))
    }

    /// Charge the submitted card for the buyer's current order.
    pub async fn process_payment(
        &self,
        context: &ShopContext,
        buyer: &Buyer,
        form: &CardForm,
    ) -> Result<PaymentDecision, CheckoutError> {
        // 1. Validate the submission before touching the shop or the processor
        let card = form.validate(buyer)?;

        // 2. Resolve the order and its amount in minor units
        let order = self
            .shop
            .get_order(context)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;
        let order_id = self.shop.get_order_unique_id(&order);
        let amount = to_minor_units(self.shop.get_order_total(&order))?;

        // 3. Build the charge
        let summary = order_summary(&order);
        let description = charge_description(
            card.buyer_email.expose(),
            &summary,
            order.shipping_address_text.as_deref(),
        );
        let request = ChargeRequest::new(
            &order_id,
            amount,
            self.currency.clone(),
            card.token.into_inner(),
            description,
            card.receipt_email.into_inner(),
        );

        if !self.breaker.allow_request().await {
            tracing::warn!(
                "Circuit Breaker [{}] is OPEN, not charging order {}",
                self.breaker.name(),
                order_id
            );
            return Ok(PaymentDecision::Unavailable { message: RETRY_LATER_MESSAGE.to_string() });
        }

        tracing::info!(
            "Charging order {} for {} {} (buyer {})",
            order_id,
            amount,
            self.currency,
            redact_email(card.buyer_email.expose())
        );

        // 4. Charge and reconcile with the shop
        match self.processor.create_charge(&request).await {
            ChargeOutcome::Success { charge_id } => {
                self.breaker.record_success().await;

                // The card is charged from here on; a shop failure must keep the charge id
                if let Err(source) = self.confirm_with_shop(&order_id, amount, &charge_id).await {
                    publish_audit(
                        "PAYMENT_UNRECONCILED",
                        &PaymentConfirmedEvent::new(
                            &order_id,
                            amount,
                            self.currency.code(),
                            &charge_id,
                            self.backend_name(),
                        ),
                    );
                    tracing::error!(
                        "Order {} was charged with {} but the shop did not confirm it: {}",
                        order_id,
                        charge_id,
                        source
                    );
                    return Err(CheckoutError::Unreconciled { order_id, charge_id, source });
                }

                publish_audit(
                    "PAYMENT_CONFIRMED",
                    &PaymentConfirmedEvent::new(&order_id, amount, self.currency.code(), &charge_id, self.backend_name()),
                );
                tracing::info!("Order {} paid with charge {}", order_id, charge_id);

                Ok(PaymentDecision::Confirmed {
                    charge_id,
                    redirect_to: self.finished_url(),
                })
            }
            ChargeOutcome::Declined { message } => {
                self.breaker.record_success().await;

                let order = self.shop.get_order_for_id(&order_id).await?;
                self.shop.cancel_payment(&order, amount, self.backend_name()).await?;

                publish_audit(
                    "PAYMENT_CANCELLED",
                    &PaymentCancelledEvent::new(&order_id, amount, self.currency.code(), self.backend_name(), &message),
                );
                tracing::info!("Card declined for order {}: {}", order_id, message);

                Ok(PaymentDecision::Declined {
                    message,
                    redirect_to: self.cancel_url(),
                })
            }
            ChargeOutcome::TransientFailure { message } => {
                self.breaker.record_failure().await;
                tracing::error!("Charge for order {} failed transiently: {}", order_id, message);

                Ok(PaymentDecision::Unavailable { message: RETRY_LATER_MESSAGE.to_string() })
            }
        }
    }

    async fn confirm_with_shop(&self, order_id: &str, amount: i64, charge_id: &str) -> Result<(), ShopError> {
        let order = self.shop.get_order_for_id(order_id).await?;
        self.shop
            .confirm_payment(&order, amount, charge_id, self.backend_name())
            .await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("{0}")]
    BadRequest(String),

    #[error("No order to pay for")]
    OrderNotFound,

    #[error(transparent)]
    Shop(#[from] ShopError),

    /// The processor captured the charge but the shop did not record it
    #[error("Order {order_id} charged with {charge_id} but not confirmed: {source}")]
    Unreconciled {
        order_id: String,
        charge_id: String,
        source: ShopError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
