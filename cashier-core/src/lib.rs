pub mod identity;
pub mod money;
pub mod payment;
pub mod shop;

pub use identity::Buyer;
pub use money::{to_minor_units, Currency, DEFAULT_CURRENCY};
pub use payment::{ChargeOutcome, ChargeRequest, PaymentProcessor};
pub use shop::{Order, OrderLine, Shop, ShopContext, ShopError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
