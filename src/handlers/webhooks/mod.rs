//! Inbound webhook endpoints.
//!
//! Each endpoint exists once per API mode; the mode in the path selects
//! which operator-configured signing secret authenticates the request.
//! Signature checks run before any handler logic and fail closed.

mod address;
mod order;

pub use address::handle_address_webhook;
pub use order::handle_order_webhook;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};

use crate::config::ApiMode;
use crate::db::AppState;

/// Webhook endpoints accept any HTTP method.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/order/{mode}", any(handle_order_webhook))
        .route(
            "/webhooks/address-validation/{mode}",
            any(handle_address_webhook),
        )
}

pub(crate) fn parse_mode(mode: &str) -> Option<ApiMode> {
    mode.parse().ok()
}

/// Uniform failure body for webhook guard rejections.
pub(crate) fn failed(status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "status": "Failed" }))).into_response()
}
