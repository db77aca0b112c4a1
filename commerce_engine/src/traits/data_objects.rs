use scg_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderItem, OrderStatusType, ProductId};

//--------------------------------------    CheckoutRequest    -------------------------------------------------------
/// Everything checkout needs from the caller. The user id comes from the auth collaborator, never the request body.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub coupon_code: Option<String>,
}

/// The result of a successful checkout: the frozen order and its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------     PaymentEvent      -------------------------------------------------------
/// Event types delivered by the payment provider. Deliveries are at-least-once and may arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEventKind {
    #[serde(rename = "payment_intent.created")]
    Created,
    #[serde(rename = "payment_intent.processing")]
    Processing,
    #[serde(rename = "payment_intent.succeeded")]
    Succeeded,
    #[serde(rename = "payment_intent.payment_failed")]
    PaymentFailed,
    #[serde(rename = "payment_intent.canceled")]
    Canceled,
    #[serde(rename = "charge.refunded")]
    Refunded,
}

impl std::fmt::Display for PaymentEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentEventKind::Created => "payment_intent.created",
            PaymentEventKind::Processing => "payment_intent.processing",
            PaymentEventKind::Succeeded => "payment_intent.succeeded",
            PaymentEventKind::PaymentFailed => "payment_intent.payment_failed",
            PaymentEventKind::Canceled => "payment_intent.canceled",
            PaymentEventKind::Refunded => "charge.refunded",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    #[serde(rename = "type")]
    pub kind: PaymentEventKind,
    pub payment_id: String,
    pub order_id: OrderId,
    pub amount: Money,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// What applying a payment event did. `AlreadyProcessed` is the idempotency result: the event had been applied
/// before and this delivery produced no side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEventOutcome {
    /// The order status changed; the updated order is attached.
    Applied(Order),
    /// The intent row was created or updated, but the order itself was left alone.
    Recorded,
    AlreadyProcessed,
}

//--------------------------------------     Bulk results      -------------------------------------------------------
/// One item's verdict inside a bulk operation. Bulk operations never abort the batch for one bad row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub id: String,
    pub success: bool,
    pub message: String,
}

impl BulkItemResult {
    pub fn ok<S: std::fmt::Display>(id: S) -> Self {
        Self { id: id.to_string(), success: true, message: "ok".to_string() }
    }

    pub fn failed<S: std::fmt::Display, M: std::fmt::Display>(id: S, message: M) -> Self {
        Self { id: id.to_string(), success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

impl FromIterator<BulkItemResult> for BulkOutcome {
    fn from_iter<I: IntoIterator<Item = BulkItemResult>>(iter: I) -> Self {
        let results: Vec<BulkItemResult> = iter.into_iter().collect();
        let succeeded = results.iter().filter(|r| r.success).count();
        Self { total: results.len(), succeeded, failed: results.len() - succeeded, results }
    }
}

//--------------------------------------     Bulk requests     -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateItem {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    /// Signed change to the available quantity. Negative deltas fail rather than drive stock below zero.
    pub delta: i64,
}
