//! HTTP client for the processor's merchant API.
//!
//! Error policy: a non-2xx response to a non-GET call is fatal for the
//! request - the upstream body is logged and a generic upstream failure is
//! raised. GET calls never throw on upstream errors; they decode to `None`,
//! which callers treat as "not found".

use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::OrderDescriptor;

const USER_AGENT: &str = concat!("Paygate/", env!("CARGO_PKG_VERSION"));

/// Processor order as returned by the orders API. Only the fields the
/// bridge branches on are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorOrder {
    pub id: String,
    pub public_id: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    amount: i64,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture_mode: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ProcessorClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ProcessorClient {
    pub fn new(http: Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let is_get = method == Method::GET;

        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", USER_AGENT);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{} {}: {}", method, path, e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() && !is_get {
            tracing::error!("Processor API {} {} failed with {}: {}", method, path, status, text);
            return Err(AppError::Upstream(format!("{} {} returned {}", method, path, status)));
        }

        // GET failures (and empty bodies) decode to null; callers map that
        // to "not found".
        if is_get && !status.is_success() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Create a processor order for one payment session. A response missing
    /// either identifier is a hard failure.
    pub async fn create_order(
        &self,
        descriptor: &OrderDescriptor,
        capture_automatically: bool,
    ) -> Result<ProcessorOrder> {
        let body = serde_json::to_value(OrderBody {
            amount: descriptor.amount,
            currency: &descriptor.currency,
            customer_id: descriptor.customer_ref.as_deref(),
            capture_mode: Some(if capture_automatically {
                "AUTOMATIC"
            } else {
                "MANUAL"
            }),
        })?;

        let json = self.request(Method::POST, "/orders", Some(&body)).await?;

        serde_json::from_value::<ProcessorOrder>(json.clone()).map_err(|_| {
            tracing::error!("Processor order create returned unexpected body: {}", json);
            AppError::Upstream("order create response missing id or public_id".to_string())
        })
    }

    /// Fetch a processor order. Upstream errors come back as `None`.
    pub async fn get_order(&self, order_id: &str) -> Result<Option<ProcessorOrder>> {
        let json = self
            .request(Method::GET, &format!("/orders/{}", order_id), None)
            .await?;

        Ok(serde_json::from_value(json).ok())
    }

    /// Patch a PENDING order with a new amount. `None` means the patch did
    /// not yield a usable order and the caller should recreate.
    pub async fn update_order(
        &self,
        order_id: &str,
        descriptor: &OrderDescriptor,
    ) -> Result<Option<ProcessorOrder>> {
        let body = serde_json::to_value(OrderBody {
            amount: descriptor.amount,
            currency: &descriptor.currency,
            customer_id: descriptor.customer_ref.as_deref(),
            capture_mode: None,
        })?;

        let json = self
            .request(Method::PATCH, &format!("/orders/{}", order_id), Some(&body))
            .await?;

        Ok(serde_json::from_value(json).ok())
    }

    /// Capture a previously authorized order.
    pub async fn capture_order(&self, order_id: &str, amount: i64) -> Result<()> {
        let body = serde_json::json!({ "amount": amount });
        self.request(
            Method::POST,
            &format!("/orders/{}/capture", order_id),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Cancel an order (e.g. an abandoned express-checkout authorization).
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.request(Method::POST, &format!("/orders/{}/cancel", order_id), None)
            .await?;
        Ok(())
    }
}
