use serde::{Deserialize, Serialize};

/// Serialized snapshot of the storefront cart, persisted per processor
/// order for express checkout. The address-validation webhook arrives
/// outside any browser session, so the cart context is rebuilt from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub customer_ref: Option<String>,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub applied_coupons: Vec<String>,
    pub totals: CartTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units.
    pub unit_amount_minor: i64,
}

/// All amounts in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotals {
    pub currency: String,
    pub subtotal_minor: i64,
    #[serde(default)]
    pub discount_minor: i64,
    #[serde(default)]
    pub shipping_minor: i64,
    #[serde(default)]
    pub tax_minor: i64,
    pub total_minor: i64,
}
