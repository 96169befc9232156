pub mod app_config;
pub mod memory_shop;
pub mod stripe;

pub use app_config::{Config, ConfigurationError, StripeKeys};
pub use memory_shop::{InMemoryShop, PaymentRecord, PaymentStatus};
pub use stripe::StripeClient;
