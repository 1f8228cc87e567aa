//! Test utilities and fixtures for Paygate integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::sync::Arc;

pub use paygate::config::{ApiMode, CapturePolicy, Config};
pub use paygate::db::{init_db, queries, AppState, DbPool};
pub use paygate::handlers;
pub use paygate::models::*;

pub const ORDER_SECRET: &str = "order-secret-sandbox";
pub const ADDRESS_SECRET: &str = "address-secret-sandbox";

/// Test configuration: sandbox secrets set, live secrets deliberately
/// unconfigured so fail-closed behavior is testable.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        mode: ApiMode::Sandbox,
        capture_policy: CapturePolicy::Automatic,
        api_key_sandbox: Some("sk_sandbox_test".to_string()),
        api_key_live: None,
        order_webhook_secret_sandbox: Some(ORDER_SECRET.to_string()),
        order_webhook_secret_live: None,
        address_webhook_secret_sandbox: Some(ADDRESS_SECRET.to_string()),
        address_webhook_secret_live: None,
        api_url_sandbox: "http://localhost:0/api/1.0".to_string(),
        api_url_live: "http://localhost:0/api/1.0".to_string(),
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Single-connection pool so every request in a test sees the same
/// in-memory database.
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

pub fn test_state() -> AppState {
    AppState {
        db: test_pool(),
        config: Arc::new(test_config()),
        http: reqwest::Client::new(),
    }
}

/// Full application router wired to a fresh in-memory database.
pub fn test_app() -> (Router, AppState) {
    test_app_with(test_config())
}

/// Same, with a caller-supplied configuration (e.g. a stubbed processor
/// base URL).
pub fn test_app_with(config: Config) -> (Router, AppState) {
    let state = AppState {
        db: test_pool(),
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };
    let app = Router::new()
        .merge(handlers::checkout::router())
        .merge(handlers::webhooks::router())
        .with_state(state.clone());
    (app, state)
}

// ============ Signature helpers ============

fn hmac_hex(secret: &str, parts: &[&[u8]]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Order-event signature header value: `v1=` + HMAC over `v1.{ts}.{body}`.
pub fn sign_order_event(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let prefix = format!("v1.{}.", timestamp);
    format!("v1={}", hmac_hex(secret, &[prefix.as_bytes(), body]))
}

/// Address-validation signature header value: HMAC over the bare body.
pub fn sign_address_event(secret: &str, body: &[u8]) -> String {
    hmac_hex(secret, &[body])
}

pub fn current_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

// ============ Fixtures ============

/// Create a test order with default values
pub fn create_test_order(conn: &Connection, amount: f64, currency: &str) -> LocalOrder {
    let input = CreateOrder {
        amount,
        currency: currency.to_string(),
        customer_ref: None,
    };
    queries::create_order(conn, &input).expect("Failed to create test order")
}

/// Create a mapping for a fresh processor order id pair
pub fn create_test_mapping(conn: &Connection) -> (String, String) {
    let order_id = uuid::Uuid::new_v4().to_string();
    let public_id = uuid::Uuid::new_v4().to_string();
    queries::insert_mapping(conn, &order_id, &public_id).expect("Failed to insert test mapping");
    (order_id, public_id)
}

/// Create a mapping already attached to a local order
pub fn create_attached_mapping(conn: &Connection, local_order_id: &str) -> (String, String) {
    let (order_id, public_id) = create_test_mapping(conn);
    queries::attach_order_mapping(conn, &order_id, local_order_id)
        .expect("Failed to attach test mapping");
    (order_id, public_id)
}

pub fn seed_test_rate(conn: &Connection, country: &str, method_id: &str, amount: i64, currency: &str) {
    let rate = ShippingRate {
        id: uuid::Uuid::new_v4().to_string(),
        country: country.to_string(),
        method_id: method_id.to_string(),
        label: format!("Test {}", method_id),
        amount_minor: amount,
        currency: currency.to_string(),
    };
    queries::insert_shipping_rate(conn, &rate).expect("Failed to seed shipping rate");
}

pub fn sample_cart(currency: &str) -> CartSnapshot {
    CartSnapshot {
        customer_ref: Some("cust-123".to_string()),
        items: vec![CartLine {
            product_id: "prod-1".to_string(),
            name: "Widget".to_string(),
            quantity: 2,
            unit_amount_minor: 1250,
        }],
        applied_coupons: Vec::new(),
        totals: CartTotals {
            currency: currency.to_string(),
            subtotal_minor: 2500,
            discount_minor: 0,
            shipping_minor: 0,
            tax_minor: 0,
            total_minor: 2500,
        },
    }
}
