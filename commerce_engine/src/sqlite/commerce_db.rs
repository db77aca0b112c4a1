//! `SqliteDatabase` is a concrete implementation of a commerce gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the [`crate::traits`] module.
//! Every flow is one transaction: SQLite serializes writers, which is exactly the isolation the stock and coupon
//! counters need — a conditional UPDATE inside the transaction can never act on a stale read.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use scg_common::Money;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{carts, coupons, db_url, new_pool, orders, payments, products, tracking};
use crate::{
    api::order_objects::{OrderQueryFilter, OrderResult},
    coupons::{validate_coupon, CouponError},
    db_types::{
        CartItem,
        Coupon,
        CouponSnapshot,
        NewCoupon,
        NewOrder,
        NewOrderItem,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        PaymentIntent,
        PaymentIntentStatus,
        Product,
        ProductId,
        TrackingEntry,
        TrackingUpdate,
    },
    order_status,
    pricing::{price_order, PricingConfig},
    traits::{
        CheckoutRequest,
        OrderApiError,
        OrderFlowDatabase,
        OrderFlowError,
        OrderManagement,
        PaymentEvent,
        PaymentEventKind,
        PaymentEventOutcome,
        PlacedOrder,
        StockAdjustment,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Validate and perform one status transition: re-read the true status from the tracking log, consult the status
/// graph, append the tracking row, refresh the cached column, and release reserved stock when the graph says so.
/// Must run inside the caller's transaction.
async fn transition_with_tracking(
    order: &Order,
    new_status: OrderStatusType,
    update: &TrackingUpdate,
    conn: &mut SqliteConnection,
) -> Result<(Order, TrackingEntry), OrderFlowError> {
    let current = tracking::latest_status(order.id, conn).await?.unwrap_or(order.status);
    order_status::validate_transition(current, new_status)?;
    let entry = tracking::append_entry(order.id, new_status, update, conn).await?;
    let updated = orders::update_cached_status(order.id, new_status, conn).await?;
    if order_status::releases_stock(current, new_status) {
        let items = orders::items_for_order(order.id, conn).await?;
        for item in &items {
            products::release_stock(&item.product_id, item.quantity, conn).await?;
        }
        debug!(
            "🗃️ Order {} moved {current} -> {new_status}; {} line(s) restored to stock",
            order.order_id,
            items.len()
        );
    } else {
        debug!("🗃️ Order {} moved {current} -> {new_status}", order.order_id);
    }
    Ok((updated, entry))
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn place_order(
        &self,
        checkout: CheckoutRequest,
        pricing: &PricingConfig,
    ) -> Result<PlacedOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::items_for_user(&checkout.user_id, &mut tx).await?;
        if cart.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        // Validate against live stock and decrement in the same statement; pricing uses the *current* product
        // price, never anything cached in the cart.
        let mut subtotal = Money::ZERO;
        let mut line_items = Vec::with_capacity(cart.len());
        for line in &cart {
            let product = products::fetch_product(&line.product_id, &mut tx)
                .await?
                .ok_or_else(|| OrderFlowError::ProductNotFound(line.product_id.clone()))?;
            products::reserve_stock(&line.product_id, line.quantity, &mut tx).await?;
            subtotal += product.price * line.quantity;
            line_items.push(NewOrderItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: product.price,
            });
        }
        let coupon = match &checkout.coupon_code {
            Some(code) => {
                let coupon = coupons::fetch_by_code(code, &mut tx).await?.ok_or(CouponError::InvalidCode)?;
                let discount = validate_coupon(&coupon, subtotal, Utc::now())?;
                Some((coupon, discount))
            },
            None => None,
        };
        let discount = coupon.as_ref().map(|(_, d)| *d).unwrap_or(Money::ZERO);
        let breakdown = price_order(subtotal, discount, pricing);
        let snapshot = coupon.as_ref().map(|(c, d)| CouponSnapshot {
            code: c.code.clone(),
            kind: c.kind,
            value: c.value,
            discount: *d,
        });
        let order = orders::insert_order(
            NewOrder {
                order_id: OrderId::generate(),
                user_id: checkout.user_id.clone(),
                subtotal: breakdown.subtotal,
                discount: breakdown.discount,
                shipping: breakdown.shipping,
                tax: breakdown.tax,
                total_price: breakdown.total,
                coupon: snapshot,
            },
            &mut tx,
        )
        .await?;
        let items = orders::insert_order_items(order.id, &line_items, &mut tx).await?;
        tracking::append_entry(
            order.id,
            OrderStatusType::Pending,
            &TrackingUpdate::with_description("Order placed"),
            &mut tx,
        )
        .await?;
        // Usage is consumed only now, with every other step already written; a failed checkout can never leak a use.
        if let Some((coupon, _)) = &coupon {
            coupons::increment_usage(coupon.id, &mut tx).await?;
        }
        carts::clear_cart(&checkout.user_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order {} placed for user {}: total {}", order.order_id, order.user_id, order.total_price);
        Ok(PlacedOrder { order, items })
    }

    async fn set_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        update: TrackingUpdate,
    ) -> Result<(Order, TrackingEntry), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let result = transition_with_tracking(&order, new_status, &update, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(&event.order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(event.order_id.clone()))?;
        let outcome = match event.kind {
            PaymentEventKind::Created => {
                match payments::fetch_by_payment_id(&event.payment_id, &mut tx).await? {
                    Some(existing) if existing.order_id == order.id => {
                        debug!("💳️ Duplicate created event for [{}]. Nothing to do", event.payment_id);
                        PaymentEventOutcome::AlreadyProcessed
                    },
                    Some(_) => {
                        return Err(OrderFlowError::PaymentOrderMismatch {
                            payment_id: event.payment_id,
                            order_id: event.order_id,
                        })
                    },
                    None => {
                        if let Some(open) = payments::open_intent_for_order(order.id, &mut tx).await? {
                            return Err(OrderFlowError::OpenIntentExists {
                                order_id: event.order_id,
                                payment_id: open.payment_id,
                            });
                        }
                        payments::insert_intent(
                            &event.payment_id,
                            order.id,
                            event.amount,
                            event.metadata.as_deref(),
                            &mut tx,
                        )
                        .await?;
                        PaymentEventOutcome::Recorded
                    },
                }
            },
            PaymentEventKind::Processing => {
                let intent = fetch_intent_for_event(&event, order.id, &mut tx).await?;
                if intent.status.is_terminal() || intent.status == PaymentIntentStatus::Processing {
                    PaymentEventOutcome::AlreadyProcessed
                } else {
                    payments::update_status(&event.payment_id, PaymentIntentStatus::Processing, &mut tx).await?;
                    // `processing` is informational and not guaranteed to arrive after `succeeded`; it only moves
                    // an order that is already paid. Arriving early it updates the intent and nothing else.
                    if order.status == OrderStatusType::Paid {
                        let update = TrackingUpdate::with_description("Payment provider is processing the order");
                        let (updated, _) =
                            transition_with_tracking(&order, OrderStatusType::Processing, &update, &mut tx).await?;
                        PaymentEventOutcome::Applied(updated)
                    } else {
                        PaymentEventOutcome::Recorded
                    }
                }
            },
            PaymentEventKind::Succeeded => {
                let intent = fetch_intent_for_event(&event, order.id, &mut tx).await?;
                if intent.status.is_terminal() {
                    if intent.status != PaymentIntentStatus::Succeeded {
                        warn!(
                            "💳️ Succeeded event for [{}] arrived after terminal status {}. Ignoring",
                            event.payment_id, intent.status
                        );
                    }
                    PaymentEventOutcome::AlreadyProcessed
                } else {
                    payments::update_status(&event.payment_id, PaymentIntentStatus::Succeeded, &mut tx).await?;
                    let update = TrackingUpdate::with_description("Payment received");
                    let (updated, _) =
                        transition_with_tracking(&order, OrderStatusType::Paid, &update, &mut tx).await?;
                    PaymentEventOutcome::Applied(updated)
                }
            },
            PaymentEventKind::PaymentFailed | PaymentEventKind::Canceled => {
                let intent = fetch_intent_for_event(&event, order.id, &mut tx).await?;
                if intent.status.is_terminal() {
                    // The exactly-once guard for stock restoration on failure.
                    PaymentEventOutcome::AlreadyProcessed
                } else {
                    payments::update_status(&event.payment_id, PaymentIntentStatus::Failed, &mut tx).await?;
                    let description = match event.kind {
                        PaymentEventKind::Canceled => "Payment cancelled by provider",
                        _ => "Payment failed",
                    };
                    let update = TrackingUpdate::with_description(description);
                    let (updated, _) =
                        transition_with_tracking(&order, OrderStatusType::Failed, &update, &mut tx).await?;
                    PaymentEventOutcome::Applied(updated)
                }
            },
            PaymentEventKind::Refunded => {
                let intent = fetch_intent_for_event(&event, order.id, &mut tx).await?;
                if intent.status == PaymentIntentStatus::Refunded {
                    PaymentEventOutcome::AlreadyProcessed
                } else {
                    payments::update_status(&event.payment_id, PaymentIntentStatus::Refunded, &mut tx).await?;
                    let update = TrackingUpdate::with_description("Payment refunded");
                    let (updated, _) =
                        transition_with_tracking(&order, OrderStatusType::Refunded, &update, &mut tx).await?;
                    PaymentEventOutcome::Applied(updated)
                }
            },
        };
        tx.commit().await?;
        debug!("💳️ Event {} for [{}] handled: {outcome:?}", event.kind, event.payment_id);
        Ok(outcome)
    }

    async fn adjust_stock(&self, adjustment: &StockAdjustment) -> Result<Product, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let product = products::adjust_stock(&adjustment.product_id, adjustment.delta, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await
    }

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        coupons::insert_coupon(coupon, &mut conn).await
    }

    async fn set_cart_item(
        &self,
        user_id: &str,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Vec<CartItem>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        // The cart only ever references real products; stock is checked at checkout, not here.
        products::fetch_product(product_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::ProductNotFound(product_id.clone()))?;
        if quantity == 0 {
            carts::remove_item(user_id, product_id, &mut tx).await?;
        } else {
            carts::upsert_item(user_id, product_id, quantity, &mut tx).await?;
        }
        let items = carts::items_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(items)
    }

    async fn remove_cart_item(&self, user_id: &str, product_id: &ProductId) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_item(user_id, product_id, &mut conn).await?;
        Ok(())
    }

    async fn expire_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderFlowError> {
        let stale = {
            let mut conn = self.pool.acquire().await?;
            orders::stale_pending_orders(older_than, &mut conn).await?
        };
        let mut expired = Vec::with_capacity(stale.len());
        for order in stale {
            let update = TrackingUpdate::with_description("Order expired: payment not received in time");
            match self.set_order_status(&order.order_id, OrderStatusType::Cancelled, update).await {
                Ok((order, _)) => expired.push(order),
                // A racing payment or cancel beat us to it. That is fine; skip the order.
                Err(e) => warn!("🗃️ Could not expire order {}: {e}", order.order_id),
            }
        }
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Fetch the intent a webhook event refers to, checking it belongs to the event's order.
async fn fetch_intent_for_event(
    event: &PaymentEvent,
    order_pk: i64,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, OrderFlowError> {
    let intent = payments::fetch_by_payment_id(&event.payment_id, conn)
        .await?
        .ok_or_else(|| OrderFlowError::PaymentIntentNotFound(event.payment_id.clone()))?;
    if intent.order_id != order_pk {
        return Err(OrderFlowError::PaymentOrderMismatch {
            payment_id: event.payment_id.clone(),
            order_id: event.order_id.clone(),
        });
    }
    Ok(intent)
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_details(&self, order_id: &OrderId) -> Result<Option<OrderResult>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_order_by_order_id(order_id, &mut conn).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = orders::items_for_order(order.id, &mut conn).await?;
        let tracking = tracking::history_for_order(order.id, &mut conn).await?;
        Ok(Some(OrderResult { order, items, tracking }))
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::items_for_user(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::fetch_by_code(code, &mut conn).await?;
        Ok(coupon)
    }

    async fn fetch_payment_intent(&self, payment_id: &str) -> Result<Option<PaymentIntent>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let intent = payments::fetch_by_payment_id(payment_id, &mut conn).await?;
        Ok(intent)
    }
}
