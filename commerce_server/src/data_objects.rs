use std::fmt::Display;

use chrono::{DateTime, Utc};
use commerce_engine::{
    db_types::{OrderStatusType, ProductId, TrackingUpdate},
    order_objects::OrderQueryFilter,
    traits::{StatusUpdateItem, StockAdjustment},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutParams {
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemParams {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusParams {
    pub status: OrderStatusType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

impl UpdateStatusParams {
    pub fn tracking_update(&self) -> TrackingUpdate {
        TrackingUpdate {
            description: self
                .description
                .clone()
                .unwrap_or_else(|| format!("Status changed to {}", self.status)),
            location: self.location.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusParams {
    pub updates: Vec<StatusUpdateItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStockParams {
    pub adjustments: Vec<StockAdjustment>,
}

/// Query-string parameters for the admin order search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatusType>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(params: OrderSearchParams) -> Self {
        let mut filter = OrderQueryFilter::default();
        if let Some(user_id) = params.user_id {
            filter = filter.with_user_id(user_id);
        }
        if let Some(status) = params.status {
            filter = filter.with_status(status);
        }
        if let Some(since) = params.since {
            filter = filter.since(since);
        }
        if let Some(until) = params.until {
            filter = filter.until(until);
        }
        filter
    }
}
