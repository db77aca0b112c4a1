use std::fmt::Debug;

use crate::{
    api::order_objects::{OrderQueryFilter, OrderResult},
    db_types::{CartItem, Coupon, Order, OrderId, PaymentIntent, Product, ProductId},
    traits::{OrderApiError, OrderManagement},
};

/// Read-only order/catalog queries, for the server's GET surface and for reporting consumers. Everything returned
/// here carries the stored pricing figures; nothing is recomputed.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn order_details(&self, order_id: &OrderId) -> Result<Option<OrderResult>, OrderApiError> {
        self.db.fetch_order_details(order_id).await
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        self.db.search_orders(query).await
    }

    pub async fn product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderApiError> {
        self.db.fetch_product(product_id).await
    }

    pub async fn cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderApiError> {
        self.db.fetch_cart(user_id).await
    }

    pub async fn coupon(&self, code: &str) -> Result<Option<Coupon>, OrderApiError> {
        self.db.fetch_coupon(code).await
    }

    pub async fn payment_intent(&self, payment_id: &str) -> Result<Option<PaymentIntent>, OrderApiError> {
        self.db.fetch_payment_intent(payment_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
