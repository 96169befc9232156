use std::sync::Arc;
use cashier_checkout::PaymentBackend;
use cashier_gateway::StripeKeys;

use crate::pages::PaymentPages;

#[derive(Clone)]
pub struct AuthConfig {
    /// Buyer tokens are ignored when no secret is configured
    pub secret: Option<String>,
    pub cookie_name: String,
}

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<PaymentBackend>,
    pub pages: Arc<PaymentPages>,
    pub publishable_key: String,
    pub auth: AuthConfig,
    /// Route prefix without trailing slash, empty when mounted at the root
    pub mount_prefix: String,
}

impl AppState {
    /// Requires validated keys, so a running server always has a publishable
    /// key to embed in the payment page.
    pub fn new(
        backend: PaymentBackend,
        keys: &StripeKeys,
        auth: AuthConfig,
        mount_prefix: &str,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            backend: Arc::new(backend),
            pages: Arc::new(PaymentPages::new()?),
            publishable_key: keys.publishable_key.clone(),
            auth,
            mount_prefix: mount_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn payment_path(&self) -> String {
        format!("{}/", self.mount_prefix)
    }

    pub fn success_path(&self) -> String {
        format!("{}/success/", self.mount_prefix)
    }
}
