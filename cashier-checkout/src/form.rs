use cashier_core::Buyer;
use cashier_shared::pii::Masked;
use serde::Deserialize;
use std::fmt;

use crate::orchestrator::CheckoutError;

/// Fields posted by the Stripe Checkout widget.
#[derive(Clone, Default, Deserialize)]
pub struct CardForm {
    #[serde(rename = "stripeToken", default)]
    pub stripe_token: Option<String>,
    #[serde(rename = "stripeEmail", default)]
    pub stripe_email: Option<String>,
}

impl fmt::Debug for CardForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardForm")
            .field("stripe_token", &self.stripe_token.as_ref().map(Masked::new))
            .field("stripe_email", &self.stripe_email.as_ref().map(Masked::new))
            .finish()
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub token: Masked<String>,
    /// Email used in the charge description
    pub buyer_email: Masked<String>,
    /// Email the processor sends the receipt to
    pub receipt_email: Masked<String>,
}

impl CardForm {
    pub fn new(token: Option<&str>, email: Option<&str>) -> Self {
        Self {
            stripe_token: token.map(str::to_string),
            stripe_email: email.map(str::to_string),
        }
    }

    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Check the submission against the buyer.
    ///
    /// The token is mandatory. A signed-in buyer's account email is used for
    /// the description; everyone else has to submit `stripeEmail`.
    pub fn validate(&self, buyer: &Buyer) -> Result<CardDetails, CheckoutError> {
        let token = Self::field(&self.stripe_token)
            .ok_or_else(|| CheckoutError::BadRequest("stripeToken not set".to_string()))?;

        let submitted_email = Self::field(&self.stripe_email);
        if let Some(email) = submitted_email {
            if !email.contains('@') {
                return Err(CheckoutError::BadRequest("stripeEmail is not a valid email address".to_string()));
            }
        }

        let buyer_email = buyer
            .account_email()
            .or(submitted_email)
            .ok_or_else(|| CheckoutError::BadRequest("stripeEmail not set".to_string()))?;

        let receipt_email = submitted_email.unwrap_or(buyer_email);

        Ok(CardDetails {
            token: Masked::new(token.to_string()),
            buyer_email: Masked::new(buyer_email.to_string()),
            receipt_email: Masked::new(receipt_email.to_string()),
        })
    }
}
