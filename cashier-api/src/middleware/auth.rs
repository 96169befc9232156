use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use cashier_core::Buyer;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl From<CustomerClaims> for Buyer {
    fn from(claims: CustomerClaims) -> Self {
        if claims.role == "GUEST" {
            return Buyer::Anonymous;
        }
        Buyer::Authenticated {
            customer_id: claims.sub,
            email: claims.email,
        }
    }
}

// ============================================================================
// Buyer Identity Middleware
// ============================================================================

/// Resolve the [`Buyer`] for every request and store it in the request
/// extensions.
///
/// The token is read from `Authorization: Bearer` or, for browser form posts,
/// from the auth cookie. No token means an anonymous buyer; a token that
/// fails validation is rejected.
pub async fn buyer_identity_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from header, then cookie
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| jar.get(&state.auth.cookie_name).map(|c| c.value().to_string()));

    // 2. Decode and validate JWT
    let buyer = match (token, state.auth.secret.as_deref()) {
        (Some(token), Some(secret)) => {
            let token_data = decode::<CustomerClaims>(
                &token,
                &DecodingKey::from_secret(secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| {
                tracing::debug!("Rejected buyer token: {}", e);
                AppError::AuthenticationError("Invalid or expired token".to_string())
            })?;
            Buyer::from(token_data.claims)
        }
        (Some(_), None) => {
            tracing::debug!("Buyer token ignored: no auth secret configured");
            Buyer::Anonymous
        }
        (None, _) => Buyer::Anonymous,
    };

    // 3. Inject buyer into request extensions
    req.extensions_mut().insert(buyer);

    Ok(next.run(req).await)
}
