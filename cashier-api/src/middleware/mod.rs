pub mod auth;

pub use auth::{buyer_identity_middleware, CustomerClaims};
