use crate::money;

/// Ephemeral value object for one processor order API call. The amount is
/// always minor units here; conversion from the storefront's decimal
/// amount happens exactly once, in the constructor. Not persisted.
#[derive(Debug, Clone)]
pub struct OrderDescriptor {
    pub amount: i64,
    pub currency: String,
    pub customer_ref: Option<String>,
}

impl OrderDescriptor {
    pub fn new(amount: f64, currency: &str, customer_ref: Option<String>) -> Self {
        Self {
            amount: money::to_processor_units(amount, currency),
            currency: currency.to_string(),
            customer_ref,
        }
    }

    /// Descriptor for the zero-value "add payment method" flow.
    pub fn zero_value(currency: &str, customer_ref: Option<String>) -> Self {
        Self::new(0.0, currency, customer_ref)
    }
}
