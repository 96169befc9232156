use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cashier_checkout::CheckoutError;
use cashier_core::{CoreError, ShopError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::BadRequest(msg) => AppError::ValidationError(msg),
            CheckoutError::OrderNotFound => AppError::NotFoundError("No order to pay for".to_string()),
            CheckoutError::Shop(ShopError::NotFound(id)) => {
                AppError::NotFoundError(format!("Order not found: {}", id))
            },
            CheckoutError::Shop(e) => AppError::InternalServerError(e.to_string()),
            err @ CheckoutError::Unreconciled { .. } => AppError::InternalServerError(err.to_string()),
            CheckoutError::Core(CoreError::ValidationError(msg)) | CheckoutError::Core(CoreError::InternalError(msg)) => {
                // Amounts come from shop data
                AppError::InternalServerError(msg)
            },
        }
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::Anyhow(anyhow::Error::new(err).context("Failed to render page"))
    }
}
