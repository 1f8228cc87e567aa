//! Webhook signature verification.
//!
//! Both webhook kinds carry an HMAC-SHA256 over the raw request body, keyed
//! with a per-mode, per-kind shared secret the operator configures. The
//! checks run as permission callbacks: they fail closed (unconfigured
//! secret, missing header, mismatch) before any handler logic executes.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Order-event webhook headers (variant with a signed timestamp).
pub const ORDER_TIMESTAMP_HEADER: &str = "merchant-request-timestamp";
pub const ORDER_SIGNATURE_HEADER: &str = "merchant-signature";

/// Address-validation webhook header (signature over the bare body).
pub const PAYLOAD_SIGNATURE_HEADER: &str = "merchant-payload-signature";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Constant-time string comparison. The length check short-circuits, but
/// digest length is not secret (always 64 hex chars plus prefix).
fn constant_time_eq(expected: &str, received: &str) -> bool {
    let expected = expected.as_bytes();
    let received = received.as_bytes();

    if expected.len() != received.len() {
        return false;
    }

    expected.ct_eq(received).into()
}

fn hmac_hex(secret: &str, parts: &[&[u8]]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    for part in parts {
        mac.update(part);
    }
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify an order-event webhook.
///
/// Expected signature: `"v1=" + hex(HMAC_SHA256(secret, "v1." + timestamp
/// + "." + body))` where `timestamp` is the `Merchant-Request-Timestamp`
/// header value.
///
/// The timestamp is bound into the signed payload but its age is not
/// checked here; the processor enforces its own redelivery window
/// server-side.
pub fn verify_order_event(secret: Option<&str>, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(timestamp) = header_str(headers, ORDER_TIMESTAMP_HEADER) else {
        return false;
    };
    let Some(received) = header_str(headers, ORDER_SIGNATURE_HEADER) else {
        return false;
    };

    let prefix = format!("v1.{}.", timestamp);
    let Some(digest) = hmac_hex(secret, &[prefix.as_bytes(), body]) else {
        return false;
    };

    constant_time_eq(&format!("v1={}", digest), received)
}

/// Verify an address-validation webhook: `hex(HMAC_SHA256(secret, body))`
/// in the `Merchant-Payload-Signature` header.
pub fn verify_address_event(secret: Option<&str>, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(received) = header_str(headers, PAYLOAD_SIGNATURE_HEADER) else {
        return false;
    };

    let Some(digest) = hmac_hex(secret, &[body]) else {
        return false;
    };

    constant_time_eq(&digest, received)
}
