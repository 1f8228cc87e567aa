//! Address-validation webhook: pure query endpoint used during express
//! checkout for real-time shipping-option lookup. Restores the cart
//! snapshot for the processor order, validates the candidate postcode, and
//! returns the delivery methods available for the address. No mutation.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{failed, parse_mode};
use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::{DeliveryMethod, ShippingAddress};
use crate::processor::signature;
use crate::shipping;

#[derive(Debug, Deserialize)]
struct AddressValidationPayload {
    order_id: String,
    shipping_address: ShippingAddress,
}

#[derive(Debug, Serialize)]
struct AddressValidationResponse {
    valid: bool,
    delivery_methods: Vec<DeliveryMethod>,
}

fn respond(valid: bool, delivery_methods: Vec<DeliveryMethod>) -> Response {
    (
        StatusCode::OK,
        Json(AddressValidationResponse {
            valid,
            delivery_methods,
        }),
    )
        .into_response()
}

pub async fn handle_address_webhook(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(mode) = parse_mode(&mode) else {
        return failed(StatusCode::NOT_FOUND);
    };

    let secret = state.config.address_webhook_secret(mode);
    if !signature::verify_address_event(secret, &headers, &body) {
        return failed(StatusCode::UNAUTHORIZED);
    }

    let payload: AddressValidationPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!("malformed address validation payload: {}", e);
            return failed(StatusCode::BAD_REQUEST);
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return failed(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Restore the express-checkout context saved when the session was
    // created; without it there is nothing to price shipping against.
    let snapshot = match queries::get_temp_session(&conn, &payload.order_id) {
        Ok(Some(s)) => s,
        Ok(None) => return failed(StatusCode::NOT_FOUND),
        Err(AppError::BadRequest(_)) => return failed(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::error!("temp session lookup failed for {}: {}", payload.order_id, e);
            return failed(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let address = &payload.shipping_address;
    let postcode = shipping::format_postcode(&address.postcode);

    if !shipping::is_valid_postcode(&postcode, &address.country) {
        tracing::info!("invalid postcode for {}: {}", address.country, postcode);
        return respond(false, Vec::new());
    }

    let methods =
        match shipping::delivery_methods_for(&conn, &address.country, &snapshot.totals.currency) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("shipping rate lookup failed: {}", e);
                return failed(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

    respond(!methods.is_empty(), methods)
}
