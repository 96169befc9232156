use axum::{
    extract::{Extension, Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use cashier_checkout::{CardForm, PaymentDecision, CheckoutPreview, URL_NAMESPACE};
use cashier_core::{Buyer, ShopContext};
use url::form_urlencoded;

use crate::{
    error::AppError,
    pages::PaymentView,
    state::AppState,
};

/// Cookie carrying the shop session, used to find the buyer's cart
pub const SESSION_COOKIE: &str = "sessionid";
/// One-shot user-facing message for the page the buyer lands on next
pub const FLASH_COOKIE: &str = "cashier_flash";

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(&state.payment_path(), get(payment_page).post(process_payment))
        .route(&state.success_path(), get(success_redirect))
}

fn shop_context(buyer: &Buyer, jar: &CookieJar) -> ShopContext {
    ShopContext {
        customer_id: buyer.customer_id().map(str::to_string),
        session_id: jar.get(SESSION_COOKIE).map(|c| c.value().to_string()),
    }
}

fn flash_cookie(message: &str) -> Cookie<'static> {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Cookie::build((FLASH_COOKIE, encoded))
        .path("/")
        .http_only(true)
        .build()
}

/// Decode and clear a pending flash message.
fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let message = jar.get(FLASH_COOKIE).and_then(|c| {
        form_urlencoded::parse(format!("m={}", c.value()).as_bytes())
            .next()
            .map(|(_, value)| value.into_owned())
    });

    match message {
        Some(message) => (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), Some(message)),
        None => (jar, None),
    }
}

fn render_page(
    state: &AppState,
    buyer: &Buyer,
    preview: Option<&CheckoutPreview>,
    error: Option<&str>,
) -> Result<String, AppError> {
    let action = state.payment_path();
    let currency = state.backend.currency().code();
    let view = PaymentView {
        publishable_key: &state.publishable_key,
        action: &action,
        namespace: URL_NAMESPACE,
        currency: preview.map(|p| p.currency.code()).unwrap_or(currency),
        amount: preview.map(|p| p.amount),
        summary: preview.map(|p| p.summary.as_str()),
        email: buyer.account_email(),
        error,
    };
    Ok(state.pages.render_payment(&view)?)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET {prefix}/
/// Render the card form for the buyer's current order
pub async fn payment_page(
    State(state): State<AppState>,
    Extension(buyer): Extension<Buyer>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let context = shop_context(&buyer, &jar);
    let preview = state.backend.checkout_preview(&context).await?;
    let (jar, flash) = take_flash(jar);

    let html = render_page(&state, &buyer, preview.as_ref(), flash.as_deref())?;
    Ok((jar, Html(html)).into_response())
}

/// POST {prefix}/
/// Charge the submitted card token and redirect to the shop
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(buyer): Extension<Buyer>,
    jar: CookieJar,
    Form(form): Form<CardForm>,
) -> Result<Response, AppError> {
    let context = shop_context(&buyer, &jar);

    match state.backend.process_payment(&context, &buyer, &form).await? {
        PaymentDecision::Confirmed { redirect_to, .. } => Ok(Redirect::to(&redirect_to).into_response()),
        PaymentDecision::Declined { message, redirect_to } => {
            let jar = jar.add(flash_cookie(&message));
            Ok((jar, Redirect::to(&redirect_to)).into_response())
        }
        PaymentDecision::Unavailable { message } => {
            // Card was not charged; let the buyer retry from the same page
            let preview = state.backend.checkout_preview(&context).await?;
            let html = render_page(&state, &buyer, preview.as_ref(), Some(&message))?;
            Ok((StatusCode::SERVICE_UNAVAILABLE, Html(html)).into_response())
        }
    }
}

/// GET {prefix}/success/
/// Return target for the processor; sends the buyer to the shop's finished page
pub async fn success_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.backend.finished_url())
}
