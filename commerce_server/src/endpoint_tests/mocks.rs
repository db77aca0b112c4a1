use commerce_engine::{
    db_types::{CartItem, Coupon, Order, OrderId, PaymentIntent, Product, ProductId},
    order_objects::{OrderQueryFilter, OrderResult},
    traits::{OrderApiError, OrderManagement},
};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_order_details(&self, order_id: &OrderId) -> Result<Option<OrderResult>, OrderApiError>;
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderApiError>;
        async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderApiError>;
        async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, OrderApiError>;
        async fn fetch_payment_intent(&self, payment_id: &str) -> Result<Option<PaymentIntent>, OrderApiError>;
    }
}
