use serde::Serialize;

/// Links a storefront order to the processor's order identifiers.
///
/// `order_id` is the processor's internal order id; `public_id` is the
/// second identifier that is safe to hand to client-side code. Both are
/// stored packed (see `ids`); this struct carries the dashed string form.
/// At most one row exists per processor order id, and the two identifiers
/// resolve to each other.
#[derive(Debug, Clone, Serialize)]
pub struct OrderMapping {
    pub order_id: String,
    pub public_id: String,
    pub local_order_id: Option<String>,
    pub created_at: i64,
}
