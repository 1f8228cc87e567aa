mod client;
pub mod signature;

pub use client::{ProcessorClient, ProcessorOrder};

/// Processor order state we branch on. Only PENDING orders may be patched
/// with a new amount.
pub const ORDER_STATE_PENDING: &str = "PENDING";
pub const ORDER_STATE_AUTHORISED: &str = "AUTHORISED";
pub const ORDER_STATE_COMPLETED: &str = "COMPLETED";

/// The one webhook event type that triggers reconciliation.
pub const EVENT_ORDER_COMPLETED: &str = "ORDER_COMPLETED";
