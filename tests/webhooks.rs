//! End-to-end webhook tests over the HTTP surface.

mod common;

use common::*;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn order_event_body(order_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event": "ORDER_COMPLETED",
        "order_id": order_id,
    }))
    .unwrap()
}

fn signed_order_request(uri: &str, body: Vec<u8>, secret: &str) -> Request<Body> {
    let ts = current_timestamp();
    let sig = sign_order_event(secret, &ts, &body);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("merchant-request-timestamp", ts)
        .header("merchant-signature", sig)
        .body(Body::from(body))
        .unwrap()
}

fn signed_address_request(uri: &str, body: Vec<u8>, secret: &str) -> Request<Body> {
    let sig = sign_address_event(secret, &body);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("merchant-payload-signature", sig)
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============ Order-event webhook ============

#[tokio::test]
async fn completed_event_captures_order() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["response"], "Completed");

    let conn = state.db.get().unwrap();
    let after = queries::get_order(&conn, &order.id).unwrap().unwrap();
    assert_eq!(after.status, OrderStatus::Processing);
    assert!(after.captured);
    assert_eq!(after.transaction_id.as_deref(), Some(order_id.as_str()));

    let notes = queries::list_order_notes(&conn, &order.id).unwrap();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].note.contains(&order_id));
}

#[tokio::test]
async fn redelivered_event_returns_422() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let first = app
        .clone()
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(second).await["status"], "Failed");

    // Exactly one audit note despite two deliveries.
    let conn = state.db.get().unwrap();
    assert_eq!(queries::list_order_notes(&conn, &order.id).unwrap().len(), 1);
}

#[tokio::test]
async fn event_for_already_paid_order_returns_422() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    queries::set_order_status(&conn, &order.id, OrderStatus::Processing).unwrap();
    drop(conn);

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_processor_order_returns_404() {
    let (app, _state) = test_app();
    let never_created = uuid::Uuid::new_v4().to_string();

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&never_created),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mapping_without_placed_order_returns_404() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let (order_id, _) = create_test_mapping(&conn);
    drop(conn);

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_signature_returns_401_without_side_effects() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/order/sandbox")
        .header("content-type", "application/json")
        .body(Body::from(order_event_body(&order_id)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let conn = state.db.get().unwrap();
    let after = queries::get_order(&conn, &order.id).unwrap().unwrap();
    assert_eq!(after.status, OrderStatus::AwaitingPayment);
    assert!(!after.captured);
}

#[tokio::test]
async fn wrong_secret_returns_401() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            order_event_body(&order_id),
            "a-different-secret",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_mode_secret_fails_closed() {
    // The live secret is not set in the test config; a correctly signed
    // request against the live endpoint must still be rejected.
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/live",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_mode_segment_returns_404() {
    let (app, _state) = test_app();
    let order_id = uuid::Uuid::new_v4().to_string();

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/staging",
            order_event_body(&order_id),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let (app, _state) = test_app();

    let response = app
        .oneshot(signed_order_request(
            "/webhooks/order/sandbox",
            b"not json at all {{{".to_vec(),
            ORDER_SECRET,
        ))
        .await
        .unwrap();

    // Body parses as a form with no recognized fields, so the required
    // event/order_id pair is missing.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_completed_event_returns_400() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let body = serde_json::to_vec(&json!({
        "event": "ORDER_AUTHORISED",
        "order_id": order_id,
    }))
    .unwrap();

    let response = app
        .oneshot(signed_order_request("/webhooks/order/sandbox", body, ORDER_SECRET))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn form_encoded_body_is_accepted() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let order = create_test_order(&conn, 20.0, "GBP");
    let (order_id, _) = create_attached_mapping(&conn, &order.id);
    drop(conn);

    let body = format!("event=ORDER_COMPLETED&order_id={}", order_id).into_bytes();
    let ts = current_timestamp();
    let sig = sign_order_event(ORDER_SECRET, &ts, &body);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/order/sandbox")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("merchant-request-timestamp", ts)
        .header("merchant-signature", sig)
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let conn = state.db.get().unwrap();
    let after = queries::get_order(&conn, &order.id).unwrap().unwrap();
    assert!(after.captured);
}

// ============ Address-validation webhook ============

fn address_body(order_id: &str, country: &str, postcode: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "order_id": order_id,
        "shipping_address": {
            "street_line_1": "1 Test Street",
            "city": "Testville",
            "country": country,
            "postcode": postcode,
        },
    }))
    .unwrap()
}

#[tokio::test]
async fn valid_address_returns_delivery_methods() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let (order_id, _) = create_test_mapping(&conn);
    queries::upsert_temp_session(&conn, &order_id, &sample_cart("GBP")).unwrap();
    seed_test_rate(&conn, "GB", "standard", 499, "GBP");
    drop(conn);

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&order_id, "GB", "sw1a 1aa"),
            ADDRESS_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["delivery_methods"][0]["id"], "standard");
    assert_eq!(body["delivery_methods"][0]["amount"], 499);
}

#[tokio::test]
async fn invalid_postcode_short_circuits() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let (order_id, _) = create_test_mapping(&conn);
    queries::upsert_temp_session(&conn, &order_id, &sample_cart("GBP")).unwrap();
    seed_test_rate(&conn, "GB", "standard", 499, "GBP");
    drop(conn);

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&order_id, "GB", "12345"),
            ADDRESS_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["delivery_methods"], json!([]));
}

#[tokio::test]
async fn no_rates_for_country_means_invalid() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let (order_id, _) = create_test_mapping(&conn);
    queries::upsert_temp_session(&conn, &order_id, &sample_cart("GBP")).unwrap();
    drop(conn);

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&order_id, "GB", "SW1A 1AA"),
            ADDRESS_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn rates_in_other_currency_are_excluded() {
    let (app, state) = test_app();
    let conn = state.db.get().unwrap();
    let (order_id, _) = create_test_mapping(&conn);
    queries::upsert_temp_session(&conn, &order_id, &sample_cart("GBP")).unwrap();
    seed_test_rate(&conn, "GB", "standard", 499, "USD");
    drop(conn);

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&order_id, "GB", "SW1A 1AA"),
            ADDRESS_SECRET,
        ))
        .await
        .unwrap();

    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["delivery_methods"], json!([]));
}

#[tokio::test]
async fn address_event_without_session_returns_404() {
    let (app, _state) = test_app();
    let never_created = uuid::Uuid::new_v4().to_string();

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&never_created, "GB", "SW1A 1AA"),
            ADDRESS_SECRET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn address_event_with_bad_signature_returns_401() {
    let (app, _state) = test_app();
    let order_id = uuid::Uuid::new_v4().to_string();

    let response = app
        .oneshot(signed_address_request(
            "/webhooks/address-validation/sandbox",
            address_body(&order_id, "GB", "SW1A 1AA"),
            "a-different-secret",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
