//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use commerce_engine::{
    pricing::PricingConfig,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CheckoutRequest, OrderFlowDatabase, PaymentEvent, PaymentEventKind, PlacedOrder},
    SqliteDatabase,
};
use scg_common::Money;

/// A fresh, fully-migrated database for one test.
pub async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database")
}

pub async fn checkout(db: &SqliteDatabase, user_id: &str, coupon_code: Option<&str>) -> PlacedOrder {
    try_checkout(db, user_id, coupon_code).await.expect("checkout failed")
}

pub async fn try_checkout(
    db: &SqliteDatabase,
    user_id: &str,
    coupon_code: Option<&str>,
) -> Result<PlacedOrder, commerce_engine::OrderFlowError> {
    let request = CheckoutRequest { user_id: user_id.to_string(), coupon_code: coupon_code.map(String::from) };
    db.place_order(request, &PricingConfig::default()).await
}

pub fn event(kind: PaymentEventKind, payment_id: &str, order: &commerce_engine::db_types::Order) -> PaymentEvent {
    PaymentEvent {
        kind,
        payment_id: payment_id.to_string(),
        order_id: order.order_id.clone(),
        amount: order.total_price,
        metadata: None,
    }
}

pub async fn stock_of(db: &SqliteDatabase, product_id: &str) -> i64 {
    use commerce_engine::{db_types::ProductId, traits::OrderManagement};
    db.fetch_product(&ProductId::from(product_id))
        .await
        .expect("product fetch failed")
        .expect("product missing")
        .stock
}

pub fn major(units: i64) -> Money {
    Money::from_major(units)
}
