//! Checkout endpoints: payment-session management against the processor's
//! orders API, storefront order placement, and the synchronous payment
//! completion path.
//!
//! Every operation works off explicit request-scoped context (app state,
//! parsed request, one pooled connection); nothing hides in ambient
//! session state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::CapturePolicy;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{
    CartSnapshot, CreateOrder, LocalOrder, OrderDescriptor, OrderNote, OrderStatus,
    PaymentMethodKind,
};
use crate::processor::{ProcessorClient, ORDER_STATE_AUTHORISED, ORDER_STATE_COMPLETED,
    ORDER_STATE_PENDING};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout/session", post(create_payment_session))
        .route("/checkout/session/{public_id}/cancel", post(cancel_session))
        .route("/checkout/express/session", post(create_express_session))
        .route("/checkout/process", post(process_payment))
        .route("/orders", post(place_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/notes", get(get_order_notes))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub customer_ref: Option<String>,
    /// Present when the client already holds a session: the PENDING
    /// processor order is patched in place, otherwise a fresh one is
    /// created.
    #[serde(default)]
    pub public_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpressSessionRequest {
    #[serde(flatten)]
    pub session: CreateSessionRequest,
    /// Cart snapshot persisted for the asynchronous address-validation
    /// callback.
    pub cart: CartSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub public_id: String,
    #[serde(flatten)]
    pub order: CreateOrder,
}

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub local_order_id: String,
    pub public_id: String,
    pub payment_method: PaymentMethodKind,
}

#[derive(Debug, Serialize)]
pub struct ProcessPaymentResponse {
    pub result: &'static str,
    pub order: LocalOrder,
}

/// Create a processor order and record its mapping. If another request
/// created the mapping first (uniqueness constraint), reuse the row it
/// wrote: both callers end up with the same public id.
///
/// Connections are taken per step and never held across a processor call.
async fn create_session(
    state: &AppState,
    client: &ProcessorClient,
    descriptor: &OrderDescriptor,
    capture_automatically: bool,
) -> Result<(String, String)> {
    let order = client.create_order(descriptor, capture_automatically).await?;

    let conn = state.db.get()?;
    match queries::insert_mapping(&conn, &order.id, &order.public_id) {
        Ok(()) => Ok((order.id, order.public_id)),
        Err(AppError::Conflict(_)) => {
            let public_id = queries::public_id_by_order_id(&conn, &order.id)?.ok_or_else(|| {
                AppError::Internal("order mapping missing after duplicate insert".to_string())
            })?;
            Ok((order.id, public_id))
        }
        Err(e) => Err(e),
    }
}

/// Patch an existing session's PENDING order with a new amount, keeping
/// its identifiers. Any reason the patch cannot apply (unknown public id,
/// order no longer PENDING, unusable patch response) falls back to
/// creating a fresh order.
async fn update_or_recreate(
    state: &AppState,
    client: &ProcessorClient,
    descriptor: &OrderDescriptor,
    public_id: &str,
    capture_automatically: bool,
) -> Result<(String, String)> {
    let order_id = {
        let conn = state.db.get()?;
        queries::order_id_by_public_id(&conn, public_id)?
    };
    let Some(order_id) = order_id else {
        return create_session(state, client, descriptor, capture_automatically).await;
    };

    let pending = client
        .get_order(&order_id)
        .await?
        .filter(|o| o.state.as_deref() == Some(ORDER_STATE_PENDING));

    if pending.is_none() {
        return create_session(state, client, descriptor, capture_automatically).await;
    }

    match client.update_order(&order_id, descriptor).await? {
        Some(updated) => Ok((updated.id, updated.public_id)),
        None => create_session(state, client, descriptor, capture_automatically).await,
    }
}

async fn session_for_request(
    state: &AppState,
    req: &CreateSessionRequest,
    capture_automatically: bool,
) -> Result<(String, String)> {
    let descriptor =
        OrderDescriptor::new(req.amount, &req.currency, req.customer_ref.clone());
    let client = state.processor_client()?;

    match &req.public_id {
        Some(public_id) => {
            update_or_recreate(state, &client, &descriptor, public_id, capture_automatically)
                .await
        }
        None => create_session(state, &client, &descriptor, capture_automatically).await,
    }
}

pub async fn create_payment_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>> {
    let capture_automatically = state.config.capture_policy == CapturePolicy::Automatic;
    let (_, public_id) = session_for_request(&state, &req, capture_automatically).await?;

    Ok(Json(SessionResponse { public_id }))
}

/// Express-checkout session: the processor order authorizes manually (the
/// total can still change with shipping), and the cart snapshot is saved
/// for the address-validation callback.
pub async fn create_express_session(
    State(state): State<AppState>,
    Json(req): Json<CreateExpressSessionRequest>,
) -> Result<Json<SessionResponse>> {
    let (order_id, public_id) = session_for_request(&state, &req.session, false).await?;

    let conn = state.db.get()?;
    queries::upsert_temp_session(&conn, &order_id, &req.cart)?;

    Ok(Json(SessionResponse { public_id }))
}

/// Place the storefront order for a payment session and attach it to the
/// mapping; from here on webhook reconciliation can find it.
pub async fn place_order(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<LocalOrder>> {
    let conn = state.db.get()?;

    let order_id = queries::order_id_by_public_id(&conn, &req.public_id)?
        .ok_or_else(|| AppError::NotFound(format!("no session for public id {}", req.public_id)))?;

    let order = queries::create_order(&conn, &req.order)?;
    queries::attach_order_mapping(&conn, &order_id, &order.id)?;

    Ok(Json(order))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocalOrder>> {
    let conn = state.db.get()?;
    let order = queries::get_order(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;
    Ok(Json(order))
}

pub async fn get_order_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderNote>>> {
    let conn = state.db.get()?;
    queries::get_order(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;
    Ok(Json(queries::list_order_notes(&conn, &id)?))
}

/// Abandon a payment session: void the processor-side authorization and
/// clear any express-checkout snapshot. A session whose order already went
/// through cannot be cancelled this way.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<StatusCode> {
    let (order_id, local) = {
        let conn = state.db.get()?;

        let order_id = queries::order_id_by_public_id(&conn, &public_id)?.ok_or_else(|| {
            AppError::NotFound(format!("no session for public id {}", public_id))
        })?;

        let local = match queries::local_order_id_by_order_id(&conn, &order_id)? {
            Some(id) => queries::get_order(&conn, &id)?,
            None => None,
        };

        (order_id, local)
    };

    if let Some(order) = &local {
        if order.status.is_paid() {
            return Err(AppError::Conflict(format!(
                "order {} is already paid",
                order.id
            )));
        }
    }

    let client = state.processor_client()?;
    client.cancel_order(&order_id).await?;

    let conn = state.db.get()?;
    queries::delete_temp_session(&conn, &order_id)?;

    if let Some(order) = local {
        queries::set_order_status(&conn, &order.id, OrderStatus::Cancelled)?;
        queries::add_order_note(
            &conn,
            &order.id,
            &format!("Payment session cancelled (Order ID: {})", order_id),
        )?;
    }

    tracing::info!("payment session cancelled (processor order {})", order_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Synchronous payment completion, uniform across payment methods. The
/// method tag only decides the capture policy; confirmation, the atomic
/// local transition, and the audit note are shared.
pub async fn process_payment(
    State(state): State<AppState>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<ProcessPaymentResponse>> {
    let method = req.payment_method.method();

    let (order_id, order) = {
        let conn = state.db.get()?;

        let order_id = queries::order_id_by_public_id(&conn, &req.public_id)?.ok_or_else(|| {
            AppError::NotFound(format!("no session for public id {}", req.public_id))
        })?;

        let order = queries::get_order(&conn, &req.local_order_id)?
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", req.local_order_id)))?;

        match queries::local_order_id_by_order_id(&conn, &order_id)? {
            None => queries::attach_order_mapping(&conn, &order_id, &order.id)?,
            Some(attached) if attached != order.id => {
                return Err(AppError::Conflict(format!(
                    "session already belongs to order {}",
                    attached
                )));
            }
            Some(_) => {}
        }

        (order_id, order)
    };

    let client = state.processor_client()?;
    let processor_order = client
        .get_order(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("processor order {} not found", order_id)))?;

    match processor_order.state.as_deref() {
        Some(ORDER_STATE_COMPLETED) => {}
        Some(ORDER_STATE_AUTHORISED) => {
            if method.capture_policy(&state.config) == CapturePolicy::Automatic {
                client.capture_order(&order_id, order.total_minor).await?;
            }
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "processor order is not payable (state: {})",
                other.unwrap_or("unknown")
            )));
        }
    }

    let conn = state.db.get()?;

    // Same guard the webhook uses; whichever side completes first wins and
    // the other sees AlreadyProcessed.
    if !queries::try_capture_order(&conn, &order.id, &order_id)? {
        return Err(AppError::AlreadyProcessed(format!(
            "order {} already captured",
            order.id
        )));
    }

    queries::add_order_note(
        &conn,
        &order.id,
        &format!("Payment processed via {} (Order ID: {})", method.id(), order_id),
    )?;

    if method.is_express_checkout() {
        if let Err(e) = queries::delete_temp_session(&conn, &order_id) {
            tracing::warn!("failed to clear temp session for {}: {}", order_id, e);
        }
    }

    let order = queries::get_order(&conn, &order.id)?
        .ok_or_else(|| AppError::Internal("order vanished after capture".to_string()))?;

    tracing::info!(
        "payment processed via {} for order {} (processor order {})",
        method.id(),
        order.id,
        order_id
    );

    Ok(Json(ProcessPaymentResponse {
        result: "success",
        order,
    }))
}
