//! Paygate - payment-gateway bridge between a storefront and its payment processor
//!
//! This library owns the processor order lifecycle (create/update/capture/cancel),
//! the order-mapping store linking storefront orders to processor orders, webhook
//! authentication and reconciliation, and express-checkout session handling.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod money;
pub mod processor;
pub mod shipping;
