use thiserror::Error;

use crate::{
    api::order_objects::{OrderQueryFilter, OrderResult},
    db_types::{CartItem, Coupon, Order, OrderId, PaymentIntent, Product, ProductId},
};

/// Read-only access to orders and their collaborators. Everything the server needs for GET endpoints lives here, so
/// route handlers can be tested against a mock without standing up a database.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetch the bare order record for the given public order reference.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError>;

    /// Fetch an order together with its line items and full tracking history.
    async fn fetch_order_details(&self, order_id: &OrderId) -> Result<Option<OrderResult>, OrderApiError>;

    /// All orders placed by the given user, oldest first.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError>;

    /// Fetch orders matching the given filter. Admin surface.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderApiError>;

    /// The user's current cart lines.
    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderApiError>;

    /// Case-insensitive coupon lookup.
    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, OrderApiError>;

    async fn fetch_payment_intent(&self, payment_id: &str) -> Result<Option<PaymentIntent>, OrderApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
