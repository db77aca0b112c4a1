use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Coupon, NewCoupon, NewProduct, Order, OrderId, OrderStatusType, Product, TrackingEntry, TrackingUpdate},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    traits::{BulkItemResult, BulkOutcome, OrderFlowDatabase, OrderFlowError, StatusUpdateItem, StockAdjustment},
};

/// `OrderFlowApi` drives every post-checkout change to an order: user cancellations, admin status updates, tracking
/// inserts, bulk updates and stock corrections. All of them funnel through the backend's guarded transition flow.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Move an order to a new status, with an optional tracking description. The transition is validated against
    /// the status graph inside the backend's transaction; an illegal move comes back as
    /// [`OrderFlowError::IllegalTransition`] with both endpoints named.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        update: TrackingUpdate,
    ) -> Result<(Order, TrackingEntry), OrderFlowError> {
        let (order, entry) = self.db.set_order_status(order_id, new_status, update).await?;
        self.publish_for_status(&order).await;
        Ok((order, entry))
    }

    /// Cancel an order on behalf of its owner. Ownership is the caller's concern; the state machine is ours.
    pub async fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<Order, OrderFlowError> {
        let update = TrackingUpdate::with_description(reason);
        let (order, _) = self.update_status(order_id, OrderStatusType::Cancelled, update).await?;
        info!("🔄️ Order {} cancelled. {reason}", order.order_id);
        Ok(order)
    }

    /// Apply a batch of status updates with partial-failure semantics: each item runs in its own transaction and
    /// failures are collected per item. The batch itself never fails.
    pub async fn bulk_update_statuses(&self, updates: Vec<StatusUpdateItem>) -> BulkOutcome {
        let mut results = Vec::with_capacity(updates.len());
        for item in updates {
            let description =
                item.description.clone().unwrap_or_else(|| format!("Status changed to {}", item.status));
            let update = TrackingUpdate::with_description(description);
            let result = match self.update_status(&item.order_id, item.status, update).await {
                Ok(_) => BulkItemResult::ok(item.order_id.as_str()),
                Err(e) => {
                    debug!("🔄️ Bulk status update failed for {}: {e}", item.order_id);
                    BulkItemResult::failed(item.order_id.as_str(), e)
                },
            };
            results.push(result);
        }
        results.into_iter().collect()
    }

    /// Apply a batch of stock corrections with the same partial-failure semantics as status updates.
    pub async fn bulk_adjust_stock(&self, adjustments: Vec<StockAdjustment>) -> BulkOutcome {
        let mut results = Vec::with_capacity(adjustments.len());
        for adjustment in adjustments {
            let result = match self.db.adjust_stock(&adjustment).await {
                Ok(product) => {
                    debug!("🔄️ Stock for {} adjusted to {}", product.id, product.stock);
                    BulkItemResult::ok(adjustment.product_id.as_str())
                },
                Err(e) => BulkItemResult::failed(adjustment.product_id.as_str(), e),
            };
            results.push(result);
        }
        results.into_iter().collect()
    }

    pub async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        self.db.upsert_product(product).await
    }

    pub async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, OrderFlowError> {
        self.db.create_coupon(coupon).await
    }

    /// Cancel pending orders that have gone unpaid for longer than `older_than`. Runs on a timer in the server.
    pub async fn expire_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderFlowError> {
        let expired = self.db.expire_stale_pending_orders(older_than).await?;
        if !expired.is_empty() {
            info!("🔄️ Expired {} stale pending orders", expired.len());
        }
        for order in &expired {
            self.publish_for_status(order).await;
        }
        Ok(expired)
    }

    async fn publish_for_status(&self, order: &Order) {
        match order.status {
            OrderStatusType::Paid => {
                for producer in &self.producers.order_paid_producer {
                    producer.publish_event(OrderPaidEvent::new(order.clone())).await;
                }
            },
            OrderStatusType::Cancelled | OrderStatusType::Refunded | OrderStatusType::Failed => {
                for producer in &self.producers.order_annulled_producer {
                    producer.publish_event(OrderAnnulledEvent::new(order.clone())).await;
                }
            },
            _ => {},
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
