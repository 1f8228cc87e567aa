use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Storefront order states this service cares about. `Processing` and
/// `Completed` count as already paid for the capture guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingPayment,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Statuses that mean payment already went through.
    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Completed)
    }
}

/// A storefront order as this service sees it. `captured` is the
/// idempotency flag set together with the transaction id; it guards
/// against duplicate webhook delivery independently of `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOrder {
    pub id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub total_minor: i64,
    pub customer_ref: Option<String>,
    pub transaction_id: Option<String>,
    pub captured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    /// Decimal display amount; converted to minor units at the boundary.
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub customer_ref: Option<String>,
}

/// Audit trail entry appended when payment state changes.
#[derive(Debug, Clone, Serialize)]
pub struct OrderNote {
    pub id: i64,
    pub order_id: String,
    pub note: String,
    pub created_at: i64,
}
