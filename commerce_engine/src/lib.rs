//! Storefront Commerce Engine
//!
//! The order lifecycle engine behind the storefront commerce gateway. It turns carts into durable orders and keeps
//! money, inventory and order status consistent under concurrency and partial failure. The library is divided into
//! three main sections:
//!
//! 1. Pure domain logic: the order status graph ([`mod@order_status`]), the pricing function ([`mod@pricing`]) and
//!    coupon rule evaluation ([`mod@coupons`]). No I/O anywhere; every mutator consults these.
//! 2. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API layer instead. The exception is the data types, which are
//!    defined in [`mod@db_types`] and are public.
//! 3. The engine public API ([`mod@api`]): checkout, order flow (status changes, bulk updates), and payment event
//!    reconciliation, each generic over the backend traits in [`mod@traits`].
//!
//! The engine also provides a set of events that can be subscribed to ([`mod@events`]). These fire after the
//! corresponding flow commits — when an order is placed, paid, or annulled — so integrations can react without
//! coupling to engine internals.
pub mod api;
pub mod coupons;
pub mod db_types;
pub mod events;
pub mod order_status;
pub mod pricing;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    checkout_api::CheckoutApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
    payment_event_api::PaymentEventApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{OrderApiError, OrderFlowDatabase, OrderFlowError, OrderManagement};
