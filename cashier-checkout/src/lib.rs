pub mod form;
pub mod orchestrator;
pub mod resiliency;
pub mod summary;

pub use form::{CardDetails, CardForm};
pub use orchestrator::{CheckoutError, CheckoutPreview, PaymentBackend, PaymentDecision, BACKEND_NAME, URL_NAMESPACE};
pub use resiliency::{CircuitBreaker, CircuitState};
