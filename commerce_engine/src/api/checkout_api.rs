use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItem, ProductId},
    events::{EventProducers, NewOrderEvent},
    pricing::PricingConfig,
    traits::{CheckoutRequest, OrderApiError, OrderFlowDatabase, OrderFlowError, PlacedOrder},
};

/// The cart-to-order boundary.
///
/// `CheckoutApi` owns the pricing configuration and hands the whole checkout to the backend as one atomic unit. It
/// also carries the thin cart surface, since the cart exists only to be consumed here.
pub struct CheckoutApi<B> {
    db: B,
    pricing: PricingConfig,
    producers: EventProducers,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, pricing: PricingConfig, producers: EventProducers) -> Self {
        Self { db, pricing, producers }
    }
}

impl<B> CheckoutApi<B>
where B: OrderFlowDatabase
{
    /// Convert the user's cart into an order. See [`OrderFlowDatabase::place_order`] for the atomicity contract.
    pub async fn checkout(
        &self,
        user_id: &str,
        coupon_code: Option<String>,
    ) -> Result<PlacedOrder, OrderFlowError> {
        let request = CheckoutRequest { user_id: user_id.to_string(), coupon_code };
        let placed = self.db.place_order(request, &self.pricing).await?;
        debug!("🛒️ Checkout complete for user {user_id}: order {}", placed.order.order_id);
        for producer in &self.producers.new_order_producer {
            producer.publish_event(NewOrderEvent::new(placed.order.clone())).await;
        }
        Ok(placed)
    }

    pub async fn cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderApiError> {
        self.db.fetch_cart(user_id).await
    }

    /// Set the quantity for a product in the cart. Quantity zero removes the line. Last writer wins.
    pub async fn set_cart_item(
        &self,
        user_id: &str,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Vec<CartItem>, OrderFlowError> {
        self.db.set_cart_item(user_id, product_id, quantity).await
    }

    pub async fn remove_cart_item(&self, user_id: &str, product_id: &ProductId) -> Result<(), OrderFlowError> {
        self.db.remove_cart_item(user_id, product_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
