use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use cashier_api::{app, AppState, AuthConfig};
use cashier_checkout::{CircuitBreaker, PaymentBackend, URL_NAMESPACE};
use cashier_gateway::{Config, InMemoryShop, StripeClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashier_api=debug,cashier_checkout=debug,cashier::audit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing processor keys stop the process here
    let config = Config::load().context("Failed to load configuration")?;
    let keys = config.stripe.validate()?;
    let mount_prefix = config.mount_prefix();
    tracing::info!(
        "Starting Cashier on port {} (payment page at '{}/', currency {})",
        config.server.port,
        mount_prefix,
        keys.currency
    );

    // Shop
    let shop = InMemoryShop::new(&config.shop.finished_url, &config.shop.cancel_url);
    if let Some(path) = &config.shop.fixture_path {
        shop.load_fixture(path).await.context("Failed to seed shop")?;
    }

    // Processor
    let processor = StripeClient::from_settings(&config.stripe, &keys)
        .context("Failed to build Stripe client")?;

    let backend = PaymentBackend::new(
        Arc::new(shop),
        Arc::new(processor),
        keys.currency.clone(),
        CircuitBreaker::new(
            URL_NAMESPACE,
            config.stripe.circuit_failure_threshold,
            config.stripe.circuit_reset(),
        ),
    );

    let app_state = AppState::new(
        backend,
        &keys,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            cookie_name: config.auth.cookie_name.clone(),
        },
        &mount_prefix,
    )
    .context("Failed to load page templates")?;

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
