use cashier_core::Currency;
use cashier_shared::pii::Masked;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub stripe: StripeSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub shop: ShopSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Where the payment routes are mounted, e.g. `/pay/stripe`
    #[serde(default = "default_mount_prefix")]
    pub mount_prefix: String,
}

/// Raw processor settings as read from files and environment. Turned into
/// [`StripeKeys`] by [`StripeSettings::validate`].
#[derive(Deserialize, Clone)]
pub struct StripeSettings {
    pub secret_key: Option<String>,
    pub publishable_key: Option<String>,
    pub currency: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_failure_threshold")]
    pub circuit_failure_threshold: usize,
    #[serde(default = "default_reset_seconds")]
    pub circuit_reset_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// HS256 secret for buyer tokens; without it every buyer is anonymous
    pub jwt_secret: Option<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShopSettings {
    #[serde(default = "default_finished_url")]
    pub finished_url: String,
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
    /// JSON file of orders to seed the in-memory shop with
    pub fixture_path: Option<String>,
}

/// Processor credentials that passed validation.
#[derive(Debug, Clone)]
pub struct StripeKeys {
    pub secret_key: Masked<String>,
    pub publishable_key: String,
    pub currency: Currency,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("You must define the {0} setting")]
    MissingSetting(&'static str),

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

fn default_mount_prefix() -> String { "/pay/stripe".to_string() }
fn default_api_base() -> String { "https://api.stripe.com".to_string() }
fn default_timeout_seconds() -> u64 { 30 }
fn default_failure_threshold() -> usize { 5 }
fn default_reset_seconds() -> u64 { 30 }
fn default_cookie_name() -> String { "cashier_token".to_string() }
fn default_finished_url() -> String { "/shop/finished/".to_string() }
fn default_cancel_url() -> String { "/shop/cart/".to_string() }

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            cookie_name: default_cookie_name(),
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            finished_url: default_finished_url(),
            cancel_url: default_cancel_url(),
            fixture_path: None,
        }
    }
}

impl std::fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &self.secret_key.as_ref().map(Masked::new))
            .field("publishable_key", &self.publishable_key)
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigurationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigurationError::MissingSetting(key))
}

impl StripeSettings {
    /// Check that both keys are present and the currency is usable.
    pub fn validate(&self) -> Result<StripeKeys, ConfigurationError> {
        let secret_key = required(&self.secret_key, "stripe.secret_key")?;
        let publishable_key = required(&self.publishable_key, "stripe.publishable_key")?;

        let currency = match self.currency.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Currency::parse(code).map_err(|e| ConfigurationError::InvalidSetting {
                key: "stripe.currency",
                reason: e.to_string(),
            })?,
            None => Currency::default(),
        };

        Ok(StripeKeys {
            secret_key: Masked::new(secret_key),
            publishable_key,
            currency,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn circuit_reset(&self) -> Duration {
        Duration::from_secs(self.circuit_reset_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigurationError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            // Shared defaults, checked in
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `CASHIER__STRIPE__SECRET_KEY=sk_live_...`
            .add_source(config::Environment::with_prefix("CASHIER").separator("__"));

        Self::from_builder(builder)
    }

    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigurationError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.stripe.validate()?;
        Ok(config)
    }

    /// Mount prefix without a trailing slash; empty for the root.
    pub fn mount_prefix(&self) -> String {
        let trimmed = self.server.mount_prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: Option<&str>, publishable: Option<&str>, currency: Option<&str>) -> StripeSettings {
        StripeSettings {
            secret_key: secret.map(str::to_string),
            publishable_key: publishable.map(str::to_string),
            currency: currency.map(str::to_string),
            api_base: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
            circuit_failure_threshold: default_failure_threshold(),
            circuit_reset_seconds: default_reset_seconds(),
        }
    }

    fn from_toml(toml: &str) -> Result<Config, ConfigurationError> {
        Config::from_builder(
            config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn test_valid_keys_default_currency() {
        let keys = settings(Some("sk_test_1"), Some("pk_test_1"), None).validate().unwrap();

        assert_eq!(keys.secret_key.expose(), "sk_test_1");
        assert_eq!(keys.publishable_key, "pk_test_1");
        assert_eq!(keys.currency.code(), "usd");
    }

    #[test]
    fn test_missing_secret_key() {
        let err = settings(None, Some("pk_test_1"), None).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSetting("stripe.secret_key")));
    }

    #[test]
    fn test_blank_publishable_key() {
        let err = settings(Some("sk_test_1"), Some("  "), None).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSetting("stripe.publishable_key")));
    }

    #[test]
    fn test_bad_currency() {
        let err = settings(Some("sk"), Some("pk"), Some("euros")).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { key: "stripe.currency", .. }));
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let debug = format!("{:?}", settings(Some("sk_live_secret"), Some("pk"), None));
        assert!(!debug.contains("sk_live_secret"));
    }

    #[test]
    fn test_load_with_defaults() {
        let config = from_toml(
            r#"
            [server]
            port = 8080

            [stripe]
            secret_key = "sk_test_1"
            publishable_key = "pk_test_1"
            currency = "EUR"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.mount_prefix(), "/pay/stripe");
        assert_eq!(config.stripe.timeout(), Duration::from_secs(30));
        assert_eq!(config.stripe.validate().unwrap().currency.code(), "eur");
        assert_eq!(config.auth.cookie_name, "cashier_token");
        assert_eq!(config.shop.cancel_url, "/shop/cart/");
    }

    #[test]
    fn test_load_fails_fast_without_keys() {
        let result = from_toml(
            r#"
            [server]
            port = 8080

            [stripe]
            publishable_key = "pk_test_1"
            "#,
        );

        assert!(matches!(result, Err(ConfigurationError::MissingSetting("stripe.secret_key"))));
    }

    #[test]
    fn test_mount_prefix_normalized() {
        let mut config = from_toml(
            r#"
            [server]
            port = 8080
            mount_prefix = "checkout/stripe/"

            [stripe]
            secret_key = "sk"
            publishable_key = "pk"
            "#,
        )
        .unwrap();
        assert_eq!(config.mount_prefix(), "/checkout/stripe");

        config.server.mount_prefix = "/".to_string();
        assert_eq!(config.mount_prefix(), "");
    }
}
