use std::env;

use strum::{Display, EnumString};

/// API environment. Webhook endpoints exist for both modes simultaneously;
/// outbound processor calls use the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ApiMode {
    Sandbox,
    Live,
}

/// When a processor order authorization is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CapturePolicy {
    /// Funds are captured as soon as the payment completes.
    Automatic,
    /// Payment is authorized only; capture happens later (operator-driven).
    Manual,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub mode: ApiMode,
    pub capture_policy: CapturePolicy,
    pub api_key_sandbox: Option<String>,
    pub api_key_live: Option<String>,
    /// Per-mode signing secrets for the order-event webhook (variant with
    /// timestamp header).
    pub order_webhook_secret_sandbox: Option<String>,
    pub order_webhook_secret_live: Option<String>,
    /// Per-mode signing secrets for the address-validation webhook.
    pub address_webhook_secret_sandbox: Option<String>,
    pub address_webhook_secret_live: Option<String>,
    pub api_url_sandbox: String,
    pub api_url_live: String,
}

const DEFAULT_API_URL_SANDBOX: &str = "https://sandbox-merchant.example.com/api/1.0";
const DEFAULT_API_URL_LIVE: &str = "https://merchant.example.com/api/1.0";

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let mode = env::var("PAYGATE_MODE")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(ApiMode::Sandbox);

        let capture_policy = env::var("PAYGATE_CAPTURE_POLICY")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(CapturePolicy::Automatic);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "paygate.db".to_string()),
            mode,
            capture_policy,
            api_key_sandbox: env::var("PAYGATE_API_KEY_SANDBOX").ok(),
            api_key_live: env::var("PAYGATE_API_KEY_LIVE").ok(),
            order_webhook_secret_sandbox: env::var("PAYGATE_ORDER_WEBHOOK_SECRET_SANDBOX").ok(),
            order_webhook_secret_live: env::var("PAYGATE_ORDER_WEBHOOK_SECRET_LIVE").ok(),
            address_webhook_secret_sandbox: env::var("PAYGATE_ADDRESS_WEBHOOK_SECRET_SANDBOX")
                .ok(),
            address_webhook_secret_live: env::var("PAYGATE_ADDRESS_WEBHOOK_SECRET_LIVE").ok(),
            api_url_sandbox: env::var("PAYGATE_API_URL_SANDBOX")
                .unwrap_or_else(|_| DEFAULT_API_URL_SANDBOX.to_string()),
            api_url_live: env::var("PAYGATE_API_URL_LIVE")
                .unwrap_or_else(|_| DEFAULT_API_URL_LIVE.to_string()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn api_key(&self, mode: ApiMode) -> Option<&str> {
        match mode {
            ApiMode::Sandbox => self.api_key_sandbox.as_deref(),
            ApiMode::Live => self.api_key_live.as_deref(),
        }
    }

    pub fn api_url(&self, mode: ApiMode) -> &str {
        match mode {
            ApiMode::Sandbox => &self.api_url_sandbox,
            ApiMode::Live => &self.api_url_live,
        }
    }

    pub fn order_webhook_secret(&self, mode: ApiMode) -> Option<&str> {
        match mode {
            ApiMode::Sandbox => self.order_webhook_secret_sandbox.as_deref(),
            ApiMode::Live => self.order_webhook_secret_live.as_deref(),
        }
    }

    pub fn address_webhook_secret(&self, mode: ApiMode) -> Option<&str> {
        match mode {
            ApiMode::Sandbox => self.address_webhook_secret_sandbox.as_deref(),
            ApiMode::Live => self.address_webhook_secret_live.as_deref(),
        }
    }
}
