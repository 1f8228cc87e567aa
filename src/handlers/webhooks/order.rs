//! Order-event webhook: authenticates the callback, resolves the local
//! order behind the processor order id, and applies the at-most-once
//! "mark paid" transition.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{failed, parse_mode};
use crate::db::{queries, AppState};
use crate::processor::{signature, EVENT_ORDER_COMPLETED};

#[derive(Debug, Deserialize)]
struct OrderEventPayload {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    event: Option<String>,
}

/// The processor delivers either JSON or form-encoded bodies.
fn parse_payload(body: &[u8]) -> Option<OrderEventPayload> {
    if let Ok(payload) = serde_json::from_slice::<OrderEventPayload>(body) {
        return Some(payload);
    }
    serde_urlencoded::from_bytes(body).ok()
}

pub async fn handle_order_webhook(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(mode) = parse_mode(&mode) else {
        return failed(StatusCode::NOT_FOUND);
    };

    // Permission check: deny before any handler logic runs. No payload
    // logging on rejection beyond standard access logs.
    let secret = state.config.order_webhook_secret(mode);
    if !signature::verify_order_event(secret, &headers, &body) {
        return failed(StatusCode::UNAUTHORIZED);
    }

    tracing::debug!("order webhook received ({} mode)", mode);

    let order_id = match parse_payload(&body) {
        Some(payload) => match (payload.order_id, payload.event) {
            (Some(order_id), Some(event)) if event == EVENT_ORDER_COMPLETED => order_id,
            _ => return failed(StatusCode::BAD_REQUEST),
        },
        None => return failed(StatusCode::BAD_REQUEST),
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return failed(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let local_order_id = match queries::local_order_id_by_order_id(&conn, &order_id) {
        Ok(Some(id)) => id,
        Ok(None) => return failed(StatusCode::NOT_FOUND),
        // A non-UUID order_id never resolves; treat it as malformed payload.
        Err(crate::error::AppError::BadRequest(_)) => return failed(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::error!("order webhook lookup failed for {}: {}", order_id, e);
            return failed(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Single conditional update: captured flag, transaction id, and status
    // guards all evaluate inside the one statement, so a concurrent
    // synchronous checkout or a redelivered webhook loses cleanly.
    match queries::try_capture_order(&conn, &local_order_id, &order_id) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(
                "order webhook for {} ignored: order {} already processed",
                order_id,
                local_order_id
            );
            return failed(StatusCode::UNPROCESSABLE_ENTITY);
        }
        Err(e) => {
            tracing::error!("capture update failed for order {}: {}", local_order_id, e);
            return failed(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    if let Err(e) = queries::add_order_note(
        &conn,
        &local_order_id,
        &format!("Payment has been successfully captured (Order ID: {})", order_id),
    ) {
        // The capture itself committed; a missing note is not worth a retry
        // storm from the processor.
        tracing::warn!("failed to append capture note to {}: {}", local_order_id, e);
    }

    tracing::info!(
        "payment captured for order {} (processor order {})",
        local_order_id,
        order_id
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "OK", "response": "Completed" })),
    )
        .into_response()
}
