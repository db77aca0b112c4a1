use chrono::Duration;
use thiserror::Error;

use crate::{
    coupons::CouponError,
    db_types::{
        CartItem,
        Coupon,
        NewCoupon,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductId,
        TrackingEntry,
        TrackingUpdate,
    },
    order_status::IllegalTransition,
    pricing::PricingConfig,
    traits::{
        data_objects::{CheckoutRequest, PaymentEvent, PaymentEventOutcome, PlacedOrder, StockAdjustment},
        OrderApiError,
        OrderManagement,
    },
};

/// The mutating half of a commerce gateway backend.
///
/// Implementations must make each method one atomic unit: either all of its writes become visible or none do.
/// Concurrent calls against the same order or product serialize on the backing store's transaction isolation, never
/// on in-process locks.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Convert the user's cart into a durable order, atomically.
    ///
    /// In a single transaction: loads the cart, validates and decrements stock per line against *live* quantities,
    /// prices the order from current product prices (plus an optional coupon), freezes unit prices and the coupon
    /// snapshot onto the order, appends the initial `pending` tracking row, increments coupon usage, and clears the
    /// cart. Failure at any step leaves no trace — no partial stock decrement, no orphan order, no coupon-usage leak.
    async fn place_order(
        &self,
        checkout: CheckoutRequest,
        pricing: &PricingConfig,
    ) -> Result<PlacedOrder, OrderFlowError>;

    /// Move an order to `new_status` and append the matching tracking row.
    ///
    /// The current status is re-read from the latest tracking row inside the transaction, the transition is
    /// validated against the status graph, and reserved stock is released when (and only when) the transition
    /// requires it. A same-status call succeeds silently and still appends its row.
    async fn set_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        update: TrackingUpdate,
    ) -> Result<(Order, TrackingEntry), OrderFlowError>;

    /// Apply one payment-provider event, idempotently.
    ///
    /// Deliveries are at-least-once: if the referenced intent is already in the event's target terminal status the
    /// call returns [`PaymentEventOutcome::AlreadyProcessed`] without side effects. Failure and refund events
    /// release the order's reserved stock exactly once, via the status graph's release rule.
    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, OrderFlowError>;

    /// Apply a signed stock correction. Negative deltas fail with `InsufficientStock` rather than go below zero.
    async fn adjust_stock(&self, adjustment: &StockAdjustment) -> Result<Product, OrderFlowError>;

    /// Create or replace a catalog product.
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError>;

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, OrderFlowError>;

    /// Set the cart quantity for a product (last-writer-wins). Returns the updated cart.
    async fn set_cart_item(
        &self,
        user_id: &str,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Vec<CartItem>, OrderFlowError>;

    async fn remove_cart_item(&self, user_id: &str, product_id: &ProductId) -> Result<(), OrderFlowError>;

    /// Cancel `pending` orders that have seen no update for longer than `older_than`, through the normal status
    /// path (tracking row appended, stock restored). Returns the orders that were cancelled.
    async fn expire_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot check out an empty cart")]
    EmptyCart,
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("{0}")]
    Coupon(#[from] CouponError),
    #[error("{0}")]
    IllegalTransition(#[from] IllegalTransition),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Coupon code {0} already exists")]
    CouponAlreadyExists(String),
    #[error("Order {order_id} already has an open payment intent ({payment_id})")]
    OpenIntentExists { order_id: OrderId, payment_id: String },
    #[error("No payment intent exists for payment id {0}")]
    PaymentIntentNotFound(String),
    #[error("Payment {payment_id} belongs to a different order than {order_id}")]
    PaymentOrderMismatch { payment_id: String, order_id: OrderId },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<OrderApiError> for OrderFlowError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(msg) => OrderFlowError::DatabaseError(msg),
        }
    }
}
