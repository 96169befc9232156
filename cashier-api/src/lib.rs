use axum::Router;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod middleware;
pub mod pages;
pub mod payment;
pub mod state;

pub use state::{AppState, AuthConfig};

/// Payment routes mounted under the configured prefix:
/// `GET|POST {prefix}/` and `GET {prefix}/success/`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(payment::routes(&state))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::buyer_identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
