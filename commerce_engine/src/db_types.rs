use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use scg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public order reference handed to customers and the payment provider, as opposed to the internal row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a fresh order reference. The storefront, not the customer, owns this namespace.
    pub fn generate() -> Self {
        Self(format!("ord-{:016x}", rand::random::<u64>()))
    }
}

//--------------------------------------       ProductId       -------------------------------------------------------
/// A lightweight wrapper around the catalog's product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub String);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for ProductId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Role          -------------------------------------------------------
/// Authorization role supplied by the external auth collaborator. The engine never authenticates; the server only
/// checks these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created; no payment has been confirmed yet.
    Pending,
    /// Payment has been received in full.
    Paid,
    /// The order is being prepared for shipment.
    Processing,
    /// The order has left the warehouse.
    Shipped,
    /// The order has reached the customer.
    Delivered,
    /// The order was cancelled by the user or an admin. Terminal.
    Cancelled,
    /// Payment was returned to the customer. Terminal.
    Refunded,
    /// Payment failed. The order can still be formally cancelled.
    Failed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Paid => "paid",
            OrderStatusType::Processing => "processing",
            OrderStatusType::Shipped => "shipped",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Refunded => "refunded",
            OrderStatusType::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 8] = [
        OrderStatusType::Pending,
        OrderStatusType::Paid,
        OrderStatusType::Processing,
        OrderStatusType::Shipped,
        OrderStatusType::Delivered,
        OrderStatusType::Cancelled,
        OrderStatusType::Refunded,
        OrderStatusType::Failed,
    ];
}

//--------------------------------------        Product        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// The authoritative unit price. Checkout always reads this, never a client-supplied figure.
    pub price: Money,
    /// Available quantity. Mutated only through the stock ledger.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

//--------------------------------------        CartItem       -------------------------------------------------------
/// One line of a user's cart. Last-writer-wins on quantity; the whole cart is consumed by a successful checkout.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: String,
    pub product_id: ProductId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       CouponKind      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    /// `value` is a whole percentage of the subtotal.
    Percentage,
    /// `value` is an absolute amount in minor currency units.
    Fixed,
}

impl Display for CouponKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponKind::Percentage => write!(f, "percentage"),
            CouponKind::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for CouponKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            s => Err(ConversionError(format!("Invalid coupon kind: {s}"))),
        }
    }
}

//--------------------------------------         Coupon        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    /// Unique, matched case-insensitively.
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    pub min_order_value: Option<Money>,
    pub max_discount: Option<Money>,
    pub usage_limit: Option<i64>,
    /// Monotonic. Incremented exactly once per order that successfully used the coupon.
    pub used_count: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    #[serde(default)]
    pub min_order_value: Option<Money>,
    #[serde(default)]
    pub max_discount: Option<Money>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

//--------------------------------------     CouponSnapshot    -------------------------------------------------------
/// The frozen copy of a coupon stored on the order it was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    pub discount: Money,
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: String,
    /// Cached projection of the latest tracking row. Never written directly; see the tracking recorder.
    pub status: OrderStatusType,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total_price: Money,
    pub coupon_code: Option<String>,
    pub coupon_kind: Option<CouponKind>,
    pub coupon_value: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The coupon snapshot frozen at checkout, if a coupon was applied.
    pub fn coupon_snapshot(&self) -> Option<CouponSnapshot> {
        match (&self.coupon_code, self.coupon_kind, self.coupon_value) {
            (Some(code), Some(kind), Some(value)) => {
                Some(CouponSnapshot { code: code.clone(), kind, value, discount: self.discount })
            },
            _ => None,
        }
    }
}

//--------------------------------------        NewOrder       -------------------------------------------------------
/// The fully-priced order record produced by checkout, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: String,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total_price: Money,
    pub coupon: Option<CouponSnapshot>,
}

//--------------------------------------       OrderItem       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price copied from the product at order-creation time. Catalog price changes never alter this.
    pub unit_price: Money,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

//--------------------------------------     TrackingEntry     -------------------------------------------------------
/// One row of the append-only status log. The order's current status is the status of its latest entry.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    pub location: Option<String>,
    pub description: String,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied part of a tracking entry. Status comes from the guarded transition, not from here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingUpdate {
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

impl TrackingUpdate {
    pub fn with_description<S: Into<String>>(description: S) -> Self {
        Self { description: description.into(), ..Default::default() }
    }
}

//-------------------------------------- PaymentIntentStatus   -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentIntentStatus {
    /// Terminal intents are never mutated again; this is the webhook idempotency guard.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentIntentStatus::Succeeded | PaymentIntentStatus::Failed | PaymentIntentStatus::Refunded)
    }
}

impl Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentIntentStatus::Pending => "pending",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Failed => "failed",
            PaymentIntentStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentIntentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment intent status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentIntent     -------------------------------------------------------
/// The provider-side payment attempt for an order. An order may accumulate several over time (retries), but at most
/// one non-terminal one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: i64,
    /// The provider's identifier. Unique; duplicate webhook deliveries are detected through it.
    pub payment_id: String,
    pub order_id: i64,
    pub amount: Money,
    pub status: PaymentIntentStatus,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
