use serde::{Deserialize, Serialize};

/// Candidate shipping address from the address-validation webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingAddress {
    pub street_line_1: String,
    #[serde(default)]
    pub street_line_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    pub postcode: String,
}

/// A shipping option the operator configured for a country.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingRate {
    pub id: String,
    pub country: String,
    pub method_id: String,
    pub label: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Delivery method as returned to the processor in the address-validation
/// response. Amount is minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryMethod {
    pub id: String,
    pub label: String,
    pub amount: i64,
}

impl From<ShippingRate> for DeliveryMethod {
    fn from(rate: ShippingRate) -> Self {
        Self {
            id: rate.method_id,
            label: rate.label,
            amount: rate.amount_minor,
        }
    }
}
