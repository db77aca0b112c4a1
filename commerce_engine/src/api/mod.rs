//! The engine's public API layer.
//!
//! Thin, backend-generic wrappers over the [`crate::traits`] contracts. Each API struct owns its event producers and
//! publishes hooks after the backend's transaction commits, never before.
pub mod checkout_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
pub mod payment_event_api;
