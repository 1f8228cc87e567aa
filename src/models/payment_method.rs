use serde::Deserialize;
use strum::{Display, EnumString};

use crate::config::{CapturePolicy, Config};

/// Request-level tag selecting how a payment is processed. Replaces the
/// stringly-typed gateway field with a closed set; each variant maps to one
/// `PaymentMethod` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Tokenized card entered in the hosted card field.
    Card,
    /// Processor-hosted wallet button.
    Pay,
    /// Browser payment-request API (Apple Pay / Google Pay style).
    PaymentRequest,
}

impl PaymentMethodKind {
    pub fn method(&self) -> &'static dyn PaymentMethod {
        match self {
            PaymentMethodKind::Card => &CardPayment,
            PaymentMethodKind::Pay => &WalletPayment,
            PaymentMethodKind::PaymentRequest => &PaymentRequestPayment,
        }
    }
}

/// Uniform contract the checkout flow drives. Implementations carry no
/// state; all per-request context is passed in by the handler.
pub trait PaymentMethod: Send + Sync {
    fn id(&self) -> &'static str;

    /// How processor orders for this method settle. Express-checkout style
    /// methods always authorize manually so the order can still be amended
    /// (shipping, final total) before capture.
    fn capture_policy(&self, config: &Config) -> CapturePolicy;

    fn is_express_checkout(&self) -> bool {
        false
    }
}

pub struct CardPayment;

impl PaymentMethod for CardPayment {
    fn id(&self) -> &'static str {
        "card"
    }

    fn capture_policy(&self, config: &Config) -> CapturePolicy {
        config.capture_policy
    }
}

pub struct WalletPayment;

impl PaymentMethod for WalletPayment {
    fn id(&self) -> &'static str {
        "pay"
    }

    fn capture_policy(&self, _config: &Config) -> CapturePolicy {
        CapturePolicy::Manual
    }

    fn is_express_checkout(&self) -> bool {
        true
    }
}

pub struct PaymentRequestPayment;

impl PaymentMethod for PaymentRequestPayment {
    fn id(&self) -> &'static str {
        "payment_request"
    }

    fn capture_policy(&self, _config: &Config) -> CapturePolicy {
        CapturePolicy::Manual
    }

    fn is_express_checkout(&self) -> bool {
        true
    }
}
